//! XML parser implementation
//!
//! A recursive descent parser that checks well-formedness and builds a
//! [`Document`]. Comments, processing instructions and the DOCTYPE
//! declaration are consumed and dropped; CDATA sections become text.

use indexmap::IndexMap;
use tracing::trace;

use crate::error::{Error, ErrorKind, Pos, Result, Span};
use crate::lexer::cursor::{is_whitespace, Cursor};
use crate::xml::entity;
use crate::xml::model::{Content, Document, Element};

/// Parser limits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum element nesting depth (0 means unlimited)
    pub max_depth: u16,
    /// Maximum input size in bytes (0 means unlimited)
    pub max_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 256,
            max_size: 0,
        }
    }
}

impl Config {
    /// Create a new config with unlimited depth and size
    pub const fn unlimited() -> Self {
        Self {
            max_depth: 0,
            max_size: 0,
        }
    }

    /// Create a new config with specific limits
    pub const fn new(max_depth: u16, max_size: usize) -> Self {
        Self {
            max_depth,
            max_size,
        }
    }
}

/// XML parser
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    config: Config,
}

impl<'a> Parser<'a> {
    /// Create a new XML parser
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, Config::default())
    }

    /// Create a new XML parser with custom limits
    pub fn with_config(input: &'a [u8], config: Config) -> Self {
        Self {
            cursor: Cursor::new(input),
            config,
        }
    }

    /// Parse an XML document
    pub fn parse(&mut self) -> Result<Document> {
        let input = self.cursor.remaining();
        if self.config.max_size > 0 && input.len() > self.config.max_size {
            return Err(Error::at(
                ErrorKind::MaxSizeExceeded {
                    max: self.config.max_size,
                },
                self.cursor.position(),
            ));
        }
        let text = std::str::from_utf8(input).map_err(|err| {
            Error::at(ErrorKind::InvalidUtf8, position_of(input, err.valid_up_to()))
        })?;
        if let Some((offset, ch)) = text.char_indices().find(|&(_, ch)| !entity::is_xml_char(ch)) {
            return Err(Error::at(
                ErrorKind::InvalidChar { code: u32::from(ch) },
                position_of(input, offset),
            ));
        }

        self.parse_prolog()?;
        let root = self.parse_element(1)?;
        self.parse_epilogue()?;

        trace!(root = %root.name, "parsed document");
        Ok(Document { root })
    }

    fn parse_prolog(&mut self) -> Result<()> {
        let mut seen_doctype = false;
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
            } else if self.cursor.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if self.cursor.starts_with(b"<!DOCTYPE") && !seen_doctype {
                self.skip_doctype()?;
                seen_doctype = true;
            } else {
                break;
            }
        }

        match self.cursor.current() {
            None => Err(Error::at(ErrorKind::NoRootElement, self.cursor.position())),
            Some(b'<') if self.cursor.peek(1).is_some_and(is_name_start) => Ok(()),
            Some(_) => Err(self.expected("root element")),
        }
    }

    fn parse_epilogue(&mut self) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.is_eof() {
                return Ok(());
            }
            if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
            } else if self.cursor.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if self.cursor.current() == Some(b'<')
                && self.cursor.peek(1).is_some_and(is_name_start)
            {
                return Err(self.error_here(ErrorKind::TrailingContent, "multiple root elements"));
            } else {
                return Err(Error::at(ErrorKind::TrailingContent, self.cursor.position()));
            }
        }
    }

    fn parse_element(&mut self, depth: u16) -> Result<Element> {
        if self.config.max_depth > 0 && depth > self.config.max_depth {
            return Err(Error::at(
                ErrorKind::MaxDepthExceeded {
                    max: self.config.max_depth,
                },
                self.cursor.position(),
            ));
        }

        self.expect_byte(b'<')?;
        let open_pos = self.cursor.position();
        let mut element = Element::new(self.parse_name()?);
        element.attributes = self.parse_attributes()?;

        if self.cursor.consume(b'/') {
            self.expect_byte(b'>')?;
            element.self_closing = true;
            return Ok(element);
        }
        self.expect_byte(b'>')?;

        loop {
            if self.cursor.is_eof() {
                return Err(Error::at(
                    ErrorKind::UnclosedTag { name: element.name },
                    open_pos,
                ));
            }

            if self.cursor.consume_bytes(b"</") {
                let close_pos = self.cursor.position();
                let close_name = self.parse_name()?;
                if close_name != element.name {
                    return Err(Error::at(
                        ErrorKind::MismatchedTag {
                            expected: element.name,
                            found: close_name,
                        },
                        close_pos,
                    ));
                }
                self.cursor.skip_whitespace();
                self.expect_byte(b'>')?;
                return Ok(element);
            }

            if self.cursor.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if self.cursor.starts_with(b"<![CDATA[") {
                let text = self.parse_cdata()?;
                element.push_text(text);
            } else if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
            } else if self.cursor.starts_with(b"<!") {
                return Err(
                    self.error_here(ErrorKind::InvalidToken, "unexpected markup declaration")
                );
            } else if self.cursor.current() == Some(b'<') {
                let child = self.parse_element(depth.saturating_add(1))?;
                element.children.push(Content::Element(child));
            } else {
                let text = self.parse_text()?;
                element.push_text(&text);
            }
        }
    }

    fn parse_attributes(&mut self) -> Result<IndexMap<String, String>> {
        let mut attrs = IndexMap::new();

        loop {
            let separated = self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/' | b'>') => break,
                Some(_) if !separated => return Err(self.expected("whitespace")),
                Some(_) => {}
                None => return Err(Error::at(ErrorKind::UnexpectedEof, self.cursor.position())),
            }

            let name_pos = self.cursor.position();
            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attrs.contains_key(&name) {
                return Err(Error::at(ErrorKind::DuplicateAttribute { name }, name_pos));
            }
            attrs.insert(name, value);
        }

        Ok(attrs)
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(self.expected("quoted attribute value")),
        };
        self.cursor.advance();

        let value_pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = bytes_to_str(self.cursor.slice_from(start), value_pos)?;
                self.cursor.advance();
                let normalized = raw.replace(['\t', '\n', '\r'], " ");
                return decode_at(&normalized, value_pos);
            }
            if b == b'<' {
                return Err(self.error_here(ErrorKind::InvalidToken, "'<' in attribute value"));
            }
            self.cursor.advance();
        }

        Err(Error::at(ErrorKind::UnexpectedEof, self.cursor.position()))
    }

    fn parse_text(&mut self) -> Result<String> {
        let text_pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }

        let raw = bytes_to_str(self.cursor.slice_from(start), text_pos)?;
        decode_at(raw, text_pos)
    }

    fn parse_cdata(&mut self) -> Result<&'a str> {
        self.cursor.advance_by(b"<![CDATA[".len());
        let text_pos = self.cursor.position();
        let start = self.cursor.pos();
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(b"]]>") {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance_by(3);
                return bytes_to_str(raw, text_pos);
            }
            self.cursor.advance();
        }
        Err(Error::at(ErrorKind::UnexpectedEof, self.cursor.position()))
    }

    fn parse_name(&mut self) -> Result<String> {
        let start_pos = self.cursor.position();
        let start = self.cursor.pos();

        match self.cursor.current() {
            Some(first) if is_name_start(first) => self.cursor.advance(),
            Some(_) => return Err(Error::at(ErrorKind::InvalidName, start_pos)),
            None => return Err(Error::at(ErrorKind::UnexpectedEof, start_pos)),
        }
        while self.cursor.current().is_some_and(is_name_char) {
            self.cursor.advance();
        }

        bytes_to_str(self.cursor.slice_from(start), start_pos).map(str::to_string)
    }

    fn skip_comment(&mut self) -> Result<()> {
        self.cursor.advance_by(b"<!--".len());
        self.skip_until(b"-->")
    }

    /// Skip `<?target ...?>`; the `xml` declaration is only allowed at the very start
    fn skip_processing_instruction(&mut self) -> Result<()> {
        let at_start = self.cursor.pos() == 0;
        let start_pos = self.cursor.position();
        self.cursor.advance_by(b"<?".len());
        let target = self.parse_name()?;
        if target.eq_ignore_ascii_case("xml") && !(at_start && target == "xml") {
            return Err(Error::with_message(
                ErrorKind::InvalidToken,
                Span::at(start_pos),
                "xml declaration not at start of document",
            ));
        }
        if self.cursor.current().is_some_and(|b| b != b'?' && !is_whitespace(b)) {
            return Err(self.expected("whitespace or '?>'"));
        }
        self.skip_until(b"?>")
    }

    /// Skip `<!DOCTYPE ...>` including a bracketed internal subset
    fn skip_doctype(&mut self) -> Result<()> {
        self.cursor.advance_by(b"<!DOCTYPE".len());
        let mut subset_depth = 0usize;
        let mut quote = None;
        while let Some(b) = self.cursor.current() {
            self.cursor.advance();
            match (quote, b) {
                (Some(q), _) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'[') => subset_depth += 1,
                (None, b']') => subset_depth = subset_depth.saturating_sub(1),
                (None, b'>') if subset_depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(Error::at(ErrorKind::UnexpectedEof, self.cursor.position()))
    }

    fn skip_until(&mut self, pattern: &[u8]) -> Result<()> {
        while !self.cursor.is_eof() {
            if self.cursor.consume_bytes(pattern) {
                return Ok(());
            }
            self.cursor.advance();
        }
        Err(Error::at(ErrorKind::UnexpectedEof, self.cursor.position()))
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.consume(expected) {
            Ok(())
        } else {
            Err(self.expected(&format!("'{}'", char::from(expected))))
        }
    }

    fn expected(&self, expected: &str) -> Error {
        let pos = self.cursor.position();
        match self.cursor.current() {
            None => Error::at(ErrorKind::UnexpectedEof, pos),
            Some(b) => Error::at(
                ErrorKind::Expected {
                    expected: expected.to_string(),
                    found: describe(b),
                },
                pos,
            ),
        }
    }

    fn error_here(&self, kind: ErrorKind, message: &str) -> Error {
        Error::with_message(kind, Span::at(self.cursor.position()), message)
    }
}

fn decode_at(raw: &str, pos: Pos) -> Result<String> {
    entity::decode(raw)
        .map(|text| text.into_owned())
        .map_err(|entity| Error::at(ErrorKind::InvalidEntity { entity }, pos))
}

fn bytes_to_str(bytes: &[u8], pos: Pos) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| Error::at(ErrorKind::InvalidUtf8, pos))
}

/// Line and column of a byte offset
fn position_of(input: &[u8], offset: usize) -> Pos {
    let mut cursor = Cursor::new(input);
    cursor.advance_by(offset);
    cursor.position()
}

fn describe(b: u8) -> String {
    if is_whitespace(b) {
        "whitespace".to_string()
    } else if b.is_ascii_graphic() {
        format!("'{}'", char::from(b))
    } else {
        format!("byte 0x{b:02x}")
    }
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<Document> {
        Parser::new(input.as_bytes()).parse()
    }

    fn kind_of(input: &str) -> Option<ErrorKind> {
        parse(input).err().map(|err| err.kind().clone())
    }

    #[test]
    fn test_parse_simple_element() -> Result<()> {
        let doc = parse("<root></root>")?;
        assert_eq!(doc.root.name, "root");
        assert!(doc.root.children.is_empty());
        assert!(!doc.root.self_closing);
        Ok(())
    }

    #[test]
    fn test_parse_with_attributes() -> Result<()> {
        let doc = parse("<root id=\"1\" name='test' />")?;
        let attrs: Vec<_> = doc.root.attributes.iter().collect();
        assert_eq!(
            attrs,
            vec![
                (&"id".to_string(), &"1".to_string()),
                (&"name".to_string(), &"test".to_string())
            ]
        );
        assert!(doc.root.self_closing);
        Ok(())
    }

    #[test]
    fn test_parse_nested() -> Result<()> {
        let doc = parse("<root><child>text</child></root>")?;
        let child = doc.root.elements().next();
        assert_eq!(child.map(|c| c.name.as_str()), Some("child"));
        assert_eq!(child.map(Element::text), Some("text".to_string()));
        Ok(())
    }

    #[test]
    fn test_prolog_and_epilogue_are_skipped() -> Result<()> {
        let input = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE nmaprun [ <!ENTITY x "y"> ]>
<!-- scan -->
<?xml-stylesheet href="nmap.xsl"?>
<nmaprun scanner="nmap"/>
<!-- done -->
"#;
        let doc = parse(input)?;
        assert_eq!(doc.root.name, "nmaprun");
        assert_eq!(doc.root.attributes.get("scanner").map(String::as_str), Some("nmap"));
        Ok(())
    }

    #[test]
    fn test_comments_and_pis_inside_elements() -> Result<()> {
        let doc = parse("<a>one<!-- gone --><?pi data?>two</a>")?;
        assert_eq!(doc.root.children, vec![Content::Text("onetwo".to_string())]);
        Ok(())
    }

    #[test]
    fn test_cdata_is_verbatim_text() -> Result<()> {
        let doc = parse("<a>x <![CDATA[<b>&amp;</b>]]> y</a>")?;
        assert_eq!(doc.root.text(), "x <b>&amp;</b> y");
        Ok(())
    }

    #[test]
    fn test_entities_are_decoded() -> Result<()> {
        let doc = parse("<a t=\"&lt;&quot;&#x41;\">&amp;&gt;&#66;</a>")?;
        assert_eq!(doc.root.attributes.get("t").map(String::as_str), Some("<\"A"));
        assert_eq!(doc.root.text(), "&>B");
        Ok(())
    }

    #[test]
    fn test_attribute_whitespace_normalized() -> Result<()> {
        let doc = parse("<a t=\"one\ttwo\nthree\"/>")?;
        assert_eq!(
            doc.root.attributes.get("t").map(String::as_str),
            Some("one two three")
        );
        Ok(())
    }

    #[test]
    fn test_whitespace_text_is_kept_in_model() -> Result<()> {
        let doc = parse("<a>\n  <b/>\n</a>")?;
        assert_eq!(doc.root.children.len(), 3);
        Ok(())
    }

    #[test]
    fn test_non_ascii_names_and_text() -> Result<()> {
        let doc = parse("<café prix=\"€\">thé</café>")?;
        assert_eq!(doc.root.name, "café");
        assert_eq!(doc.root.text(), "thé");
        Ok(())
    }

    #[test]
    fn test_mismatched_tag() {
        assert_eq!(
            kind_of("<a><b></a>"),
            Some(ErrorKind::MismatchedTag {
                expected: "b".to_string(),
                found: "a".to_string()
            })
        );
    }

    #[test]
    fn test_unclosed_tag() {
        assert_eq!(
            kind_of("<a><b></b>"),
            Some(ErrorKind::UnclosedTag {
                name: "a".to_string()
            })
        );
    }

    #[test]
    fn test_truncated_input() {
        assert_eq!(kind_of("<a x=\"1"), Some(ErrorKind::UnexpectedEof));
        assert_eq!(kind_of("<a"), Some(ErrorKind::UnexpectedEof));
        assert_eq!(kind_of("<a><!-- open"), Some(ErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_no_root_element() {
        assert_eq!(kind_of(""), Some(ErrorKind::NoRootElement));
        assert_eq!(kind_of("  \n "), Some(ErrorKind::NoRootElement));
        assert_eq!(kind_of("<?xml version=\"1.0\"?><!-- c -->"), Some(ErrorKind::NoRootElement));
    }

    #[test]
    fn test_text_before_root() {
        assert!(matches!(kind_of("hello"), Some(ErrorKind::Expected { .. })));
    }

    #[test]
    fn test_multiple_roots() {
        assert_eq!(kind_of("<a/><b/>"), Some(ErrorKind::TrailingContent));
        assert_eq!(kind_of("<a/>tail"), Some(ErrorKind::TrailingContent));
    }

    #[test]
    fn test_duplicate_attribute() {
        assert_eq!(
            kind_of("<a x=\"1\" x=\"2\"/>"),
            Some(ErrorKind::DuplicateAttribute {
                name: "x".to_string()
            })
        );
    }

    #[test]
    fn test_attribute_syntax_errors() {
        assert!(matches!(kind_of("<a x=1/>"), Some(ErrorKind::Expected { .. })));
        assert!(matches!(kind_of("<a x=\"1\"y=\"2\"/>"), Some(ErrorKind::Expected { .. })));
        assert_eq!(kind_of("<a x=\"<\"/>"), Some(ErrorKind::InvalidToken));
    }

    #[test]
    fn test_invalid_entity() {
        assert_eq!(
            kind_of("<a>&bogus;</a>"),
            Some(ErrorKind::InvalidEntity {
                entity: "bogus".to_string()
            })
        );
    }

    #[test]
    fn test_invalid_utf8() {
        let err = Parser::new(b"<a>\xff</a>").parse().err();
        assert_eq!(err.as_ref().map(Error::kind), Some(&ErrorKind::InvalidUtf8));
        assert_eq!(err.map(|e| e.span().start.col), Some(4));
    }

    #[test]
    fn test_control_characters_are_rejected() {
        assert_eq!(kind_of("<a>\u{1}</a>"), Some(ErrorKind::InvalidChar { code: 1 }));
        assert_eq!(kind_of("<a t=\"\u{8}\"/>"), Some(ErrorKind::InvalidChar { code: 8 }));
        assert_eq!(
            kind_of("<a><![CDATA[\u{1b}]]></a>"),
            Some(ErrorKind::InvalidChar { code: 0x1b })
        );
        assert_eq!(kind_of("<a>\u{FFFF}</a>"), Some(ErrorKind::InvalidChar { code: 0xFFFF }));

        let err = parse("<a>\n x\u{7f}\u{0}</a>").err();
        let start = err.map(|e| e.span().start);
        assert_eq!(start.map(|p| (p.line, p.col)), Some((2, 4)));
    }

    #[test]
    fn test_signed_character_references_are_rejected() {
        assert_eq!(
            kind_of("<a>&#+65;</a>"),
            Some(ErrorKind::InvalidEntity {
                entity: "#+65".to_string()
            })
        );
        assert!(matches!(kind_of("<a t=\"&#x+41;\"/>"), Some(ErrorKind::InvalidEntity { .. })));
        assert!(matches!(kind_of("<a>&#1;</a>"), Some(ErrorKind::InvalidEntity { .. })));
    }

    #[test]
    fn test_xml_declaration_only_at_document_start() -> Result<()> {
        parse("<?xml version=\"1.0\"?><a/>")?;
        parse("<?xml-model href=\"a.rng\"?><a><?xml-x?></a>")?;

        assert_eq!(kind_of("<a/><?xml version=\"1.0\"?>"), Some(ErrorKind::InvalidToken));
        assert_eq!(kind_of("<a><?xml version=\"1.0\"?></a>"), Some(ErrorKind::InvalidToken));
        assert_eq!(kind_of(" <?xml version=\"1.0\"?><a/>"), Some(ErrorKind::InvalidToken));
        assert_eq!(kind_of("<!-- c --><?xml version=\"1.0\"?><a/>"), Some(ErrorKind::InvalidToken));
        assert_eq!(kind_of("<?XML version=\"1.0\"?><a/>"), Some(ErrorKind::InvalidToken));
        assert!(matches!(kind_of("<?pi/x?><a/>"), Some(ErrorKind::Expected { .. })));
        Ok(())
    }

    #[test]
    fn test_default_depth_limit() {
        let depth = usize::from(Config::default().max_depth);
        let at_limit = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
        assert!(parse(&at_limit).is_ok());

        let over = format!("<b>{at_limit}</b>");
        assert_eq!(
            kind_of(&over),
            Some(ErrorKind::MaxDepthExceeded {
                max: Config::default().max_depth
            })
        );
    }

    #[test]
    fn test_error_position() {
        let err = parse("<a>\n  <b></c>\n</a>").err();
        let start = err.map(|e| e.span().start);
        assert_eq!(start.map(|p| (p.line, p.col)), Some((2, 8)));
    }

    #[test]
    fn test_max_depth() {
        let config = Config::new(2, 0);
        let ok = Parser::with_config(b"<a><b/></a>", config).parse();
        assert!(ok.is_ok());

        let err = Parser::with_config(b"<a><b><c/></b></a>", config).parse().err();
        assert_eq!(
            err.map(|e| e.kind().clone()),
            Some(ErrorKind::MaxDepthExceeded { max: 2 })
        );
    }

    #[test]
    fn test_max_size() {
        let err = Parser::with_config(b"<abc/>", Config::new(0, 4)).parse().err();
        assert_eq!(
            err.map(|e| e.kind().clone()),
            Some(ErrorKind::MaxSizeExceeded { max: 4 })
        );
    }
}
