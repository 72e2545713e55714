//! XML tree to JSON value mapping
//!
//! The document `<root ...>` becomes `{"root": <element>}` where each element maps as:
//!
//! - attributes become keys prefixed with [`Convention::attribute_prefix`]
//! - child elements are grouped by tag name in first-seen order; a name seen
//!   once maps to its value, a repeated name maps to an array in document order
//! - text (trimmed, whitespace-only ignored) is stored under
//!   [`Convention::text_key`] when the element also has attributes or children
//! - an element with only text becomes that string, an empty element becomes `{}`
//!
//! Text is never coerced: numbers and booleans stay strings.

use indexmap::IndexMap;

use crate::value::{Array, Object, Value};
use crate::xml::model::{Document, Element};

/// Reserved key names used to keep attributes and text apart from child elements
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Convention {
    pub attribute_prefix: String,
    pub text_key: String,
}

impl Default for Convention {
    fn default() -> Self {
        Self {
            attribute_prefix: "-".to_string(),
            text_key: "#text".to_string(),
        }
    }
}

impl Convention {
    pub fn new(attribute_prefix: impl Into<String>, text_key: impl Into<String>) -> Self {
        Self {
            attribute_prefix: attribute_prefix.into(),
            text_key: text_key.into(),
        }
    }

    fn attribute_key(&self, name: &str) -> String {
        format!("{}{name}", self.attribute_prefix)
    }
}

/// Map a whole document, keyed by the root element name
pub fn document_to_value(doc: &Document, convention: &Convention) -> Value {
    let mut root = Object::with_capacity(1);
    root.insert(doc.root.name.as_str(), element_to_value(&doc.root, convention));
    Value::Object(root)
}

/// Map a single element
pub fn element_to_value(element: &Element, convention: &Convention) -> Value {
    let text = element.text();
    let text = trim_xml_whitespace(&text);

    if element.attributes.is_empty() && !element.has_elements() {
        return if text.is_empty() {
            Value::Object(Object::new())
        } else {
            Value::String(text.to_string())
        };
    }

    let mut obj = Object::new();
    for (name, value) in &element.attributes {
        insert_merged(&mut obj, convention.attribute_key(name), vec![Value::from(value.as_str())]);
    }

    if !text.is_empty() {
        insert_merged(&mut obj, convention.text_key.clone(), vec![Value::from(text)]);
    }

    let mut groups: IndexMap<&str, Vec<Value>> = IndexMap::new();
    for child in element.elements() {
        groups
            .entry(child.name.as_str())
            .or_default()
            .push(element_to_value(child, convention));
    }
    for (name, values) in groups {
        insert_merged(&mut obj, name.to_string(), values);
    }

    Value::Object(obj)
}

/// Insert one or more values under `key`: a single value is stored as is,
/// several become an array. A key that is already present (possible only with
/// a convention whose reserved keys can clash with tag names) is extended into
/// an array instead of being overwritten.
fn insert_merged(obj: &mut Object, key: String, mut values: Vec<Value>) {
    if let Some(existing) = obj.0.get_mut(&key) {
        let mut merged = match std::mem::take(existing) {
            Value::Array(Array(items)) => items,
            other => vec![other],
        };
        merged.append(&mut values);
        *existing = Value::from(merged);
        return;
    }

    let value = if values.len() == 1 {
        values.pop().unwrap_or_default()
    } else {
        Value::from(values)
    };
    obj.insert(key, value);
}

fn trim_xml_whitespace(text: &str) -> &str {
    text.trim_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\r'))
}
