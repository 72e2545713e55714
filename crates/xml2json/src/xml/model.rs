//! XML data model

use indexmap::IndexMap;

/// XML document
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub root: Element,
}

/// XML element
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Element {
    pub name: String,
    /// Attributes in document order
    pub attributes: IndexMap<String, String>,
    pub children: Vec<Content>,
    /// Written as `<name/>`
    pub self_closing: bool,
}

/// XML content node
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    Element(Element),
    /// Character data with entities decoded; CDATA sections are merged in verbatim
    Text(String),
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Iterate over child elements, skipping text
    pub fn elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|child| match child {
            Content::Element(element) => Some(element),
            Content::Text(_) => None,
        })
    }

    /// Concatenation of all direct text children in document order
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                Content::Text(text) => Some(text.as_str()),
                Content::Element(_) => None,
            })
            .collect()
    }

    pub fn has_elements(&self) -> bool {
        self.elements().next().is_some()
    }

    /// Append text, merging with a preceding text node
    pub(crate) fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Content::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Content::Text(text.to_string()));
        }
    }
}
