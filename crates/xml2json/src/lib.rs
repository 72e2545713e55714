//! xml2json - XML to JSON conversion
//!
//! Parses a well-formed XML document and maps it onto JSON using the common
//! "attributes get a `-` prefix, mixed text goes under `#text`, repeated
//! siblings become arrays" convention.
//!
//! # Quick Start
//!
//! ```
//! # fn main() -> Result<(), xml2json::Error> {
//! let json = xml2json::convert(r#"<a x="1"><b>hi</b><b>bye</b></a>"#)?;
//! assert_eq!(json, r#"{"a":{"-x":"1","b":["hi","bye"]}}"#);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result, Span};

pub mod input;
pub use input::Input;

pub mod lexer;

pub mod value;
pub use value::{Array, Object, Value};

pub mod json;
pub use json::FormatConfig;

pub mod mapping;
pub use mapping::Convention;

pub mod xml;
pub use xml::{
    Config as XmlConfig, Content as XmlContent, Document as XmlDocument, Element as XmlElement,
    Parser as XmlParser,
};

pub mod convert;
pub use convert::{convert, convert_bytes, convert_reader, convert_with_options, ConvertOptions};

/// Parse XML from string
pub fn from_xml_str(s: &str) -> Result<XmlDocument> {
    from_xml_bytes(s.as_bytes())
}

/// Parse XML from bytes
pub fn from_xml_bytes(bytes: &[u8]) -> Result<XmlDocument> {
    let input = Input::from_bytes(bytes);
    let mut parser = XmlParser::new(input.as_bytes());
    parser.parse()
}
