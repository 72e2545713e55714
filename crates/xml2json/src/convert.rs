//! XML to JSON conversion entry points

use std::io::Read;

use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::input::Input;
use crate::json;
use crate::mapping::{document_to_value, Convention};
use crate::value::Value;
use crate::xml::parser::{Config as XmlConfig, Parser as XmlParser};

/// Conversion options
#[derive(Clone, Debug, Default)]
pub struct ConvertOptions {
    pub xml: XmlConfig,
    pub convention: Convention,
    /// Name reported for input read by [`convert_reader`], e.g. `<stdin>`
    pub source_name: Option<String>,
}

impl ConvertOptions {
    fn input<'a>(&'a self, bytes: &'a [u8]) -> Input<'a> {
        let input = Input::from_bytes(bytes);
        match self.source_name.as_deref() {
            Some(name) => input.with_name(name),
            None => input,
        }
    }
}

/// Convert an XML document to compact JSON with default options
pub fn convert(input: &str) -> Result<String> {
    convert_with_options(Input::from_str(input), &ConvertOptions::default())
}

/// Convert raw XML bytes to compact JSON with default options
pub fn convert_bytes(input: &[u8]) -> Result<String> {
    convert_with_options(Input::from_bytes(input), &ConvertOptions::default())
}

/// Read `reader` to the end and convert its contents
pub fn convert_reader<R: Read>(mut reader: R, options: &ConvertOptions) -> Result<String> {
    let mut buffer = Vec::new();
    reader
        .read_to_end(&mut buffer)
        .map_err(|err| Error::io(&err))?;
    debug!(bytes = buffer.len(), "input read");
    convert_with_options(options.input(&buffer), options)
}

/// Convert with explicit options
pub fn convert_with_options(input: Input<'_>, options: &ConvertOptions) -> Result<String> {
    let value = xml_to_value(input, options)?;
    Ok(json::to_string(&value))
}

/// Parse and map without serializing
#[instrument(
    level = "debug",
    skip_all,
    fields(source = input.name().unwrap_or("<memory>"), bytes = input.len())
)]
pub fn xml_to_value(input: Input<'_>, options: &ConvertOptions) -> Result<Value> {
    let mut parser = XmlParser::with_config(input.as_bytes(), options.xml);
    let doc = parser.parse()?;
    debug!(root = %doc.root.name, "document parsed");
    Ok(document_to_value(&doc, &options.convention))
}
