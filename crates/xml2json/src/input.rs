//! Input abstraction for different sources

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Input source abstraction
#[derive(Clone, Debug)]
pub struct Input<'a> {
    source: &'a [u8],
    name: Option<&'a str>,
}

impl<'a> Input<'a> {
    /// Create from byte slice, dropping a leading UTF-8 byte order mark
    pub fn from_bytes(source: &'a [u8]) -> Self {
        Self {
            source: source.strip_prefix(UTF8_BOM).unwrap_or(source),
            name: None,
        }
    }

    /// Create from string
    pub fn from_str(source: &'a str) -> Self {
        Self::from_bytes(source.as_bytes())
    }

    /// Set a source name (file path, `<stdin>`) for diagnostics
    pub const fn with_name(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }

    /// Get source bytes
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.source
    }

    /// Get source name if set
    pub const fn name(&self) -> Option<&str> {
        self.name
    }

    /// Get length in bytes
    pub const fn len(&self) -> usize {
        self.source.len()
    }

    /// Check if empty
    pub const fn is_empty(&self) -> bool {
        self.source.is_empty()
    }
}

impl<'a> From<&'a str> for Input<'a> {
    fn from(s: &'a str) -> Self {
        Self::from_str(s)
    }
}

impl<'a> From<&'a [u8]> for Input<'a> {
    fn from(b: &'a [u8]) -> Self {
        Self::from_bytes(b)
    }
}
