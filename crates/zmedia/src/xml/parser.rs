//! XML parser implementation

use indexmap::IndexMap;

use crate::error::{Error, ErrorKind, Pos, Result, Span};
use crate::xml::cursor::Cursor;
use crate::xml::model::{is_name_char, is_name_start, Declaration, Document, NodeId};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Configuration for the XML parser
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
            max_depth: 128,
            max_size: 10 * 1024 * 1024, // 10 MB default
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

/// XML parser producing a [`Document`]
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    config: Config,
    depth: u16,
}

impl<'a> Parser<'a> {
    /// Create a new parser with default configuration
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, Config::default())
    }

    /// Create a new parser with custom configuration
    pub fn with_config(input: &'a [u8], config: Config) -> Self {
        let input = input.strip_prefix(UTF8_BOM).unwrap_or(input);
        Self {
            cursor: Cursor::new(input),
            config,
            depth: 0,
        }
    }

    /// Parse a whole document: optional declaration, one root element, and
    /// nothing but whitespace, comments or processing instructions around it
    pub fn parse(&mut self) -> Result<Document> {
        if self.config.max_size > 0 && self.cursor.remaining().len() > self.config.max_size {
            return Err(Error::at(
                ErrorKind::MaxSizeExceeded {
                    max: self.config.max_size,
                },
                self.cursor.position(),
            ));
        }

        self.cursor.skip_whitespace();
        let declaration = if self.at_declaration() {
            self.parse_declaration()?
        } else {
            Declaration::default()
        };

        self.skip_misc()?;
        if self.cursor.is_eof() {
            return Err(self.error_here(ErrorKind::Expected {
                expected: "root element".to_string(),
                found: "end of input".to_string(),
            }));
        }

        self.expect_byte(b'<')?;
        let name = self.parse_name()?;
        let mut doc = Document::with_root(name, declaration);
        let root = doc.root_id();
        self.parse_elements(&mut doc, root)?;

        self.skip_misc()?;
        if !self.cursor.is_eof() {
            return Err(self.error_here(ErrorKind::Expected {
                expected: "end of input".to_string(),
                found: "content after root element".to_string(),
            }));
        }

        Ok(doc)
    }

    fn at_declaration(&self) -> bool {
        self.cursor.starts_with(b"<?xml")
            && matches!(
                self.cursor.remaining().get(5),
                Some(b' ' | b'\t' | b'\r' | b'\n' | b'?')
            )
    }

    fn parse_declaration(&mut self) -> Result<Declaration> {
        self.cursor.advance_by(5);
        let start = self.cursor.position();
        let fields = self.parse_attributes()?;
        self.expect_byte(b'?')?;
        self.expect_byte(b'>')?;

        let mut declaration = Declaration::default();
        for (name, value) in fields {
            match name.as_str() {
                "version" => declaration.version = value,
                "encoding" => declaration.encoding = value,
                "standalone" => declaration.standalone = value,
                _ => {
                    return Err(Error::at(
                        ErrorKind::Expected {
                            expected: "version, encoding or standalone".to_string(),
                            found: name,
                        },
                        start,
                    ));
                }
            }
        }
        Ok(declaration)
    }

    /// Parse attributes, content and closing tag of the element `root`, whose
    /// opening `<name` has already been consumed, along with everything nested
    /// inside it. Open elements live on an explicit stack, so nesting depth is
    /// bounded by `max_depth` and memory rather than by the call stack.
    fn parse_elements(&mut self, doc: &mut Document, root: NodeId) -> Result<()> {
        if !self.parse_start_tag(doc, root)? {
            return Ok(());
        }
        let mut open = vec![OpenElement::new(root)];

        while let Some(top) = open.last_mut() {
            if self.cursor.starts_with(b"</") {
                let pos = self.cursor.position();
                self.cursor.advance_by(2);
                let close = self.parse_name()?;
                let name = &doc.slot(top.id).name;
                if &close != name {
                    return Err(Error::at(
                        ErrorKind::MismatchedTag {
                            open: name.clone(),
                            close,
                        },
                        pos,
                    ));
                }
                self.cursor.skip_whitespace();
                self.expect_byte(b'>')?;

                if let Some(done) = open.pop() {
                    doc.slot_mut(done.id).text = collect_text(done.segments, done.has_elements);
                }
                self.depth = self.depth.saturating_sub(1);
                continue;
            }

            if self.cursor.starts_with(b"<!--") {
                self.skip_comment()?;
                continue;
            }

            if self.cursor.starts_with(b"<![CDATA[") {
                return Err(self.error_here(ErrorKind::Expected {
                    expected: "element or character data".to_string(),
                    found: "CDATA section".to_string(),
                }));
            }

            if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
                continue;
            }

            if self.cursor.consume(b'<') {
                top.has_elements = true;
                let parent = top.id;
                let name = self.parse_name()?;
                let child = doc.push_child(parent, name);
                if self.parse_start_tag(doc, child)? {
                    open.push(OpenElement::new(child));
                }
                continue;
            }

            if self.cursor.is_eof() {
                return Err(self.error_here(ErrorKind::UnexpectedEof));
            }

            let segment = self.parse_text()?;
            top.segments.push(segment);
        }

        Ok(())
    }

    /// Attributes and the end of a start tag. Returns `false` for a
    /// self-closing element, which has no content to parse.
    fn parse_start_tag(&mut self, doc: &mut Document, id: NodeId) -> Result<bool> {
        self.enter()?;
        doc.slot_mut(id).attributes = self.parse_attributes()?;

        if self.cursor.consume(b'/') {
            self.expect_byte(b'>')?;
            self.depth = self.depth.saturating_sub(1);
            return Ok(false);
        }
        self.expect_byte(b'>')?;
        Ok(true)
    }

    fn enter(&mut self) -> Result<()> {
        self.depth = self.depth.saturating_add(1);
        if self.config.max_depth > 0 && self.depth > self.config.max_depth {
            return Err(self.error_here(ErrorKind::MaxDepthExceeded {
                max: self.config.max_depth,
            }));
        }
        Ok(())
    }

    fn parse_attributes(&mut self) -> Result<IndexMap<String, String>> {
        let mut attrs = IndexMap::new();

        loop {
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/' | b'>' | b'?') => break,
                Some(_) => {}
                None => return Err(self.error_here(ErrorKind::UnexpectedEof)),
            }

            let pos = self.cursor.position();
            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attrs.contains_key(&name) {
                return Err(Error::at(ErrorKind::DuplicateAttribute { name }, pos));
            }
            attrs.insert(name, value);
        }

        Ok(attrs)
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(q @ (b'"' | b'\'')) => q,
            Some(other) => {
                return Err(self.error_here(ErrorKind::Expected {
                    expected: "quoted attribute value".to_string(),
                    found: char::from(other).to_string(),
                }))
            }
            None => return Err(self.error_here(ErrorKind::UnexpectedEof)),
        };
        self.cursor.advance();

        let start_pos = self.cursor.position();
        let raw = self.cursor.take_while(|b| b != quote);
        if !self.cursor.consume(quote) {
            return Err(self.error_here(ErrorKind::UnexpectedEof));
        }
        let text = bytes_to_str(raw, start_pos)?;
        decode_entities(text).map_err(|kind| Error::at(kind, start_pos))
    }

    fn parse_text(&mut self) -> Result<String> {
        let start_pos = self.cursor.position();
        let raw = self.cursor.take_while(|b| b != b'<');
        let text = bytes_to_str(raw, start_pos)?;
        decode_entities(text).map_err(|kind| Error::at(kind, start_pos))
    }

    fn parse_name(&mut self) -> Result<String> {
        let start_pos = self.cursor.position();
        match self.cursor.current() {
            Some(first) if is_name_start(first) => {}
            Some(_) => return Err(Error::at(ErrorKind::InvalidToken, start_pos)),
            None => return Err(Error::at(ErrorKind::UnexpectedEof, start_pos)),
        }

        let raw = self.cursor.take_while(is_name_char);
        bytes_to_str(raw, start_pos).map(str::to_string)
    }

    /// Skip whitespace, comments, processing instructions and a DOCTYPE
    fn skip_misc(&mut self) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
            } else if self.cursor.starts_with(b"<!DOCTYPE") {
                self.skip_until(b">")?;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_comment(&mut self) -> Result<()> {
        self.cursor.advance_by(4);
        self.skip_until(b"-->")
    }

    fn skip_processing_instruction(&mut self) -> Result<()> {
        self.cursor.advance_by(2);
        self.skip_until(b"?>")
    }

    fn skip_until(&mut self, pattern: &[u8]) -> Result<()> {
        if self.cursor.skip_past(pattern) {
            Ok(())
        } else {
            Err(self.error_here(ErrorKind::UnexpectedEof))
        }
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        match self.cursor.current() {
            Some(b) if b == expected => {
                self.cursor.advance();
                Ok(())
            }
            Some(b) => Err(self.error_here(ErrorKind::Expected {
                expected: char::from(expected).to_string(),
                found: char::from(b).to_string(),
            })),
            None => Err(self.error_here(ErrorKind::UnexpectedEof)),
        }
    }

    fn error_here(&self, kind: ErrorKind) -> Error {
        Error::at(kind, self.cursor.position())
    }
}

/// Element whose end tag has not been seen yet
struct OpenElement {
    id: NodeId,
    segments: Vec<String>,
    has_elements: bool,
}

impl OpenElement {
    fn new(id: NodeId) -> Self {
        Self {
            id,
            segments: Vec::new(),
            has_elements: false,
        }
    }
}

/// Element text from its character-data segments.
///
/// Whitespace-only segments between child elements are layout, not content.
/// An element without child elements keeps its data verbatim, so `<a></a>`
/// has empty text while `<a/>` has none.
fn collect_text(segments: Vec<String>, has_elements: bool) -> Option<String> {
    if !has_elements {
        return Some(segments.concat());
    }
    let kept: Vec<String> = segments
        .into_iter()
        .filter(|segment| !segment.bytes().all(is_xml_whitespace))
        .collect();
    if kept.is_empty() {
        None
    } else {
        Some(kept.concat())
    }
}

const fn is_xml_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

fn bytes_to_str(bytes: &[u8], pos: Pos) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| {
        Error::with_message(
            ErrorKind::InvalidToken,
            Span::at(pos),
            "invalid utf-8",
        )
    })
}

/// Decode the predefined entities and numeric character references
pub(crate) fn decode_entities(input: &str) -> std::result::Result<String, ErrorKind> {
    if !input.contains('&') {
        return Ok(input.to_string());
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        let (before, after) = rest.split_at(amp);
        result.push_str(before);
        let after = after.get(1..).unwrap_or_default();

        let Some(end) = after.find(';') else {
            return Err(ErrorKind::InvalidEntity {
                entity: after.chars().take(8).collect(),
            });
        };
        let (entity, tail) = after.split_at(end);

        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => decode_numeric_entity(entity),
        };
        match decoded {
            Some(ch) => result.push(ch),
            None => {
                return Err(ErrorKind::InvalidEntity {
                    entity: entity.to_string(),
                })
            }
        }
        rest = tail.get(1..).unwrap_or_default();
    }
    result.push_str(rest);

    Ok(result)
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ensure_eq<T: PartialEq + std::fmt::Debug>(left: T, right: T) -> Result<()> {
        if left == right {
            Ok(())
        } else {
            Err(Error::with_message(
                ErrorKind::InvalidToken,
                Span::empty(),
                format!("assertion failed: left={left:?} right={right:?}"),
            ))
        }
    }

    fn parse(input: &str) -> Result<Document> {
        Parser::new(input.as_bytes()).parse()
    }

    #[test]
    fn test_parse_simple_element() -> Result<()> {
        let doc = parse("<root></root>")?;
        ensure_eq(doc.root().name(), "root")?;
        ensure_eq(doc.root().has_children(), false)?;
        ensure_eq(doc.root().text(), Some(""))?;
        Ok(())
    }

    #[test]
    fn test_parse_self_closing_has_no_text() -> Result<()> {
        let doc = parse("<root><child /></root>")?;
        let child = doc.root().child_node("child");
        ensure_eq(child.map(|c| c.text()), Some(None))?;
        ensure_eq(doc.root().text(), None)?;
        Ok(())
    }

    #[test]
    fn test_parse_with_attributes() -> Result<()> {
        let doc = parse("<root id=\"1\" name='test'></root>")?;
        ensure_eq(doc.root().attribute("id"), Some("1"))?;
        ensure_eq(doc.root().attribute("name"), Some("test"))?;
        let order: Vec<_> = doc.root().attributes().map(|(k, _)| k).collect();
        ensure_eq(order, vec!["id", "name"])?;
        Ok(())
    }

    #[test]
    fn test_parse_nested() -> Result<()> {
        let doc = parse("<root><child>text</child></root>")?;
        ensure_eq(doc.node_path_value("child"), Some("text"))?;
        let child = doc.root().child_node("child");
        ensure_eq(
            child.and_then(|c| c.parent_node()).map(|p| p.name()),
            Some("root"),
        )?;
        Ok(())
    }

    #[test]
    fn test_parse_declaration() -> Result<()> {
        let doc = parse("<?xml version=\"1.1\" encoding='ISO-8859-1' standalone=\"no\"?>\n<a/>")?;
        ensure_eq(doc.declaration().version.as_str(), "1.1")?;
        ensure_eq(doc.declaration().encoding.as_str(), "ISO-8859-1")?;
        ensure_eq(doc.declaration().standalone.as_str(), "no")?;
        Ok(())
    }

    #[test]
    fn test_missing_declaration_uses_defaults() -> Result<()> {
        let doc = parse("<a/>")?;
        ensure_eq(doc.declaration(), &Declaration::default())?;
        Ok(())
    }

    #[test]
    fn test_unknown_declaration_field() {
        let result = parse("<?xml version=\"1.0\" flavour=\"sweet\"?><a/>");
        assert!(matches!(
            result.map_err(|e| e.kind().clone()),
            Err(ErrorKind::Expected { .. })
        ));
    }

    #[test]
    fn test_whitespace_between_elements_is_dropped() -> Result<()> {
        let doc = parse("<a>\n\t<b>  </b>\n\t<c/>\n</a>")?;
        ensure_eq(doc.root().text(), None)?;
        ensure_eq(doc.node_path_value("b"), Some("  "))?;
        Ok(())
    }

    #[test]
    fn test_entities_are_decoded() -> Result<()> {
        let doc = parse("<a t=\"&quot;&apos;&amp;&lt;&gt;\">&#65;&#x42;&amp;c</a>")?;
        ensure_eq(doc.root().attribute("t"), Some("\"'&<>"))?;
        ensure_eq(doc.root().text(), Some("AB&c"))?;
        Ok(())
    }

    #[test]
    fn test_invalid_entity() {
        let err = parse("<a>&nbsp;</a>").map_err(|e| e.kind().clone());
        assert_eq!(
            err.err(),
            Some(ErrorKind::InvalidEntity {
                entity: "nbsp".to_string()
            })
        );
        assert!(parse("<a>&amp</a>").is_err());
    }

    #[test]
    fn test_comments_and_instructions_are_skipped() -> Result<()> {
        let doc = parse(
            "<?xml version=\"1.0\"?><!-- saved state --><?app hint?>\
             <a><!-- inner --><b/><?pi?></a><!-- trailing -->",
        )?;
        ensure_eq(doc.node_count(), 2)?;
        ensure_eq(doc.root().text(), None)?;
        Ok(())
    }

    #[test]
    fn test_mismatched_tag() {
        let err = parse("<a><b></a></b>").map_err(|e| e.kind().clone());
        assert_eq!(
            err.err(),
            Some(ErrorKind::MismatchedTag {
                open: "b".to_string(),
                close: "a".to_string()
            })
        );
    }

    #[test]
    fn test_duplicate_attribute() {
        assert!(matches!(
            parse("<a x=\"1\" x=\"2\"/>").map_err(|e| e.kind().clone()),
            Err(ErrorKind::DuplicateAttribute { .. })
        ));
    }

    #[test]
    fn test_rejects_malformed_documents() {
        for input in [
            "",
            "   ",
            "<?xml version=\"1.0\"?>",
            "<a>",
            "<a></b>",
            "<a x=1/>",
            "<a/><b/>",
            "text<a/>",
            "<a><![CDATA[x]]></a>",
            "</a>",
            "<1a/>",
        ] {
            assert!(parse(input).is_err(), "{input:?} should fail");
        }
    }

    #[test]
    fn test_max_depth() {
        let input = "<a><a><a><a/></a></a></a>";
        let config = Config::new(3, 0);
        let result = Parser::with_config(input.as_bytes(), config).parse();
        assert_eq!(
            result.map_err(|e| e.kind().clone()).err(),
            Some(ErrorKind::MaxDepthExceeded { max: 3 })
        );
        assert!(Parser::with_config(input.as_bytes(), Config::new(4, 0))
            .parse()
            .is_ok());
    }

    #[test]
    fn test_unlimited_depth_uses_no_recursion() -> Result<()> {
        let depth = 100_000;
        let input = format!("{}x{}", "<n>".repeat(depth), "</n>".repeat(depth));
        let doc = Parser::with_config(input.as_bytes(), Config::unlimited()).parse()?;
        ensure_eq(doc.node_count(), depth)?;

        let mut node = doc.root();
        while let Some(child) = node.child_node("n") {
            node = child;
        }
        ensure_eq(node.text(), Some("x"))?;
        ensure_eq(node.depth(), depth - 1)?;
        Ok(())
    }

    #[test]
    fn test_depth_is_restored_after_siblings() {
        // Three levels at most, even though six elements open in total
        let input = "<a><b><c/></b><b><c></c></b></a>";
        assert!(Parser::with_config(input.as_bytes(), Config::new(3, 0))
            .parse()
            .is_ok());
    }

    #[test]
    fn test_max_size() {
        let input = "<root>0123456789</root>";
        let result = Parser::with_config(input.as_bytes(), Config::new(0, 8)).parse();
        assert_eq!(
            result.map_err(|e| e.kind().clone()).err(),
            Some(ErrorKind::MaxSizeExceeded { max: 8 })
        );
        assert!(Parser::with_config(input.as_bytes(), Config::unlimited())
            .parse()
            .is_ok());
    }

    #[test]
    fn test_byte_order_mark() -> Result<()> {
        let doc = Parser::new(b"\xEF\xBB\xBF<a/>").parse()?;
        ensure_eq(doc.root().name(), "a")?;
        Ok(())
    }

    #[test]
    fn test_error_position() {
        let err = parse("<a>\n  <b></c>\n</a>");
        let line = err.map_err(|e| e.span().start.line).err();
        assert_eq!(line, Some(2));
    }

    #[test]
    fn test_decode_entities_passthrough() {
        assert_eq!(decode_entities("plain").ok(), Some("plain".to_string()));
        assert_eq!(decode_entities("a &amp; b").ok(), Some("a & b".to_string()));
    }
}
