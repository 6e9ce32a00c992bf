//! zmedia - state documents and query builders for a media player core
//!
//! Two independent pieces:
//!
//! - [`xml`]: a mutable XML element tree with node-path access
//!   (`"Player/Queue/@Position"`), compact and formatted serialization, and a
//!   parser that reads it all back.
//! - [`query`]: `WHERE` selection trees with positional arguments and
//!   multi-key `ORDER BY` clauses.
//!
//! # Quick Start
//!
//! ```
//! use zmedia::{Document, SortClause, WhereClause};
//! # fn main() -> Result<(), zmedia::Error> {
//! let mut state = Document::new("App")
//!     .ok_or_else(|| zmedia::Error::unpositioned(zmedia::ErrorKind::InvalidArgument))?;
//! state.set_node_path_value("Player/@Position", "1500")?;
//!
//! let saved = state.to_xml(true);
//! let restored = Document::read(&saved);
//! assert_eq!(
//!     restored.as_ref().and_then(|d| d.node_path_value("Player/@Position")),
//!     Some("1500")
//! );
//!
//! let filter = WhereClause::create("artist = ?", ["Portishead"]).and("is_music != 0");
//! assert_eq!(filter.selection(), "(artist = ? AND is_music != 0)");
//! assert_eq!(SortClause::asc("album").then_by_asc("track").to_sql(), "album ASC, track ASC");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result, Span};

pub mod query;
pub use query::{Operator, Selection, SortClause, SortDirection, SortKey, WhereClause};

pub mod xml;
pub use xml::{
    Config as XmlConfig, Declaration as XmlDeclaration, Document, Node, NodeId, NodeMut,
    Parser as XmlParser,
};

/// Parse an XML document from a string, without depth or size limits
pub fn from_xml_str(s: &str) -> Result<Document> {
    Document::parse(s)
}

/// Parse an XML document from bytes, without depth or size limits
pub fn from_xml_bytes(bytes: &[u8]) -> Result<Document> {
    let mut parser = XmlParser::with_config(bytes, XmlConfig::unlimited());
    parser.parse()
}

/// Parse an XML document with custom limits, for untrusted input
pub fn from_xml_str_with_config(s: &str, config: XmlConfig) -> Result<Document> {
    Document::parse_with_config(s, config)
}
