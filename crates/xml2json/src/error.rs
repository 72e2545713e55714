//! Error types for xml2json

use std::fmt;
use thiserror::Error;

/// Position in source input
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Span representing a range in source input
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub const fn at(pos: Pos) -> Self {
        Self::new(pos, pos)
    }

    pub const fn empty() -> Self {
        Self {
            start: Pos::new(0, 0, 0),
            end: Pos::new(0, 0, 0),
        }
    }
}

/// Error kind for detailed categorization
///
/// Every kind except [`ErrorKind::Io`] means the input is not well-formed XML.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Reading the input failed
    Io,
    /// Input ended in the middle of a construct
    UnexpectedEof,
    /// Document has no root element
    NoRootElement,
    /// Content follows the root element
    TrailingContent,
    Expected { expected: String, found: String },
    InvalidName,
    MismatchedTag { expected: String, found: String },
    UnclosedTag { name: String },
    DuplicateAttribute { name: String },
    InvalidEntity { entity: String },
    InvalidUtf8,
    /// Character outside the XML 1.0 `Char` range
    InvalidChar { code: u32 },
    InvalidToken,
    MaxDepthExceeded { max: u16 },
    MaxSizeExceeded { max: usize },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => write!(f, "i/o error"),
            Self::UnexpectedEof => write!(f, "unexpected end of input"),
            Self::NoRootElement => write!(f, "no root element"),
            Self::TrailingContent => write!(f, "content after root element"),
            Self::Expected { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Self::InvalidName => write!(f, "invalid name"),
            Self::MismatchedTag { expected, found } => {
                write!(f, "mismatched closing tag: expected </{expected}>, found </{found}>")
            }
            Self::UnclosedTag { name } => write!(f, "unclosed tag <{name}>"),
            Self::DuplicateAttribute { name } => write!(f, "duplicate attribute: {name}"),
            Self::InvalidEntity { entity } => write!(f, "invalid entity reference: &{entity};"),
            Self::InvalidUtf8 => write!(f, "invalid utf-8"),
            Self::InvalidChar { code } => write!(f, "invalid character U+{code:04X}"),
            Self::InvalidToken => write!(f, "invalid token"),
            Self::MaxDepthExceeded { max } => write!(f, "max depth exceeded: {max}"),
            Self::MaxSizeExceeded { max } => write!(f, "max size exceeded: {max}"),
        }
    }
}

/// Main error type for xml2json
#[derive(Error, Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    span: Span,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            span,
            message,
        }
    }

    pub fn with_message(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Create error at specific position
    pub fn at(kind: ErrorKind, pos: Pos) -> Self {
        Self::new(kind, Span::at(pos))
    }

    /// Wrap a failure to read the input
    pub fn io(err: &std::io::Error) -> Self {
        Self::with_message(ErrorKind::Io, Span::empty(), format!("i/o error: {err}"))
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when the input was read but is not well-formed XML
    pub fn is_malformed(&self) -> bool {
        !matches!(self.kind, ErrorKind::Io)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_malformed() {
            write!(f, "malformed xml at {}: {}", self.span.start, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

/// Result type alias for xml2json
pub type Result<T> = std::result::Result<T, Error>;
