//! XML document model
//!
//! Every node of a [`Document`] lives in a single arena owned by the document.
//! Nodes refer to each other through [`NodeId`] indices, so a child's link back
//! to its parent never owns anything.

use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{Error, ErrorKind, Result, Span};
use crate::xml::node::{Node, NodeMut};
use crate::xml::parser::{Config, Parser};
use crate::xml::path;
use crate::xml::writer;

/// Handle to a node inside a [`Document`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in its document's arena
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Storage for a single element
#[derive(Clone, Debug, Default)]
pub(crate) struct NodeData {
    pub(crate) name: String,
    pub(crate) attributes: IndexMap<String, String>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) text: Option<String>,
    pub(crate) parent: Option<NodeId>,
}

/// Values emitted in the `<?xml ...?>` declaration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Declaration {
    pub version: String,
    pub encoding: String,
    pub standalone: String,
}

impl Default for Declaration {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            encoding: "UTF-8".to_string(),
            standalone: "yes".to_string(),
        }
    }
}

/// XML document: a declaration plus a tree of elements rooted at [`Document::root`]
#[derive(Clone, Debug)]
pub struct Document {
    declaration: Declaration,
    nodes: Vec<NodeData>,
}

impl Document {
    /// Create a document with an empty root element.
    ///
    /// Returns `None` when `root_name` is not a usable element name.
    pub fn new(root_name: &str) -> Option<Self> {
        if !is_valid_name(root_name) {
            debug!(root_name, "rejected document root name");
            return None;
        }
        Some(Self::with_root(root_name.to_string(), Declaration::default()))
    }

    /// Create a document with an explicit declaration
    pub fn with_declaration(root_name: &str, declaration: Declaration) -> Option<Self> {
        let mut doc = Self::new(root_name)?;
        doc.declaration = declaration;
        Some(doc)
    }

    pub(crate) fn with_root(root_name: String, declaration: Declaration) -> Self {
        Self {
            declaration,
            nodes: vec![NodeData {
                name: root_name,
                ..NodeData::default()
            }],
        }
    }

    /// Read a document, logging and discarding any parse error.
    ///
    /// Empty or malformed input yields `None`; callers treat that as
    /// "no stored state".
    pub fn read(xml: &str) -> Option<Self> {
        match Self::parse(xml) {
            Ok(doc) => {
                debug!(
                    root = doc.root().name(),
                    nodes = doc.node_count(),
                    "read xml document"
                );
                Some(doc)
            }
            Err(err) => {
                warn!(error = %err, "failed to read xml document");
                None
            }
        }
    }

    /// Parse a document.
    ///
    /// No depth or size limit applies: the mutators build trees of any shape,
    /// and anything [`Document::to_xml`] writes must read back. Use
    /// [`Document::parse_with_config`] for untrusted input.
    pub fn parse(xml: &str) -> Result<Self> {
        Parser::with_config(xml.as_bytes(), Config::unlimited()).parse()
    }

    /// Parse a document with custom limits
    pub fn parse_with_config(xml: &str, config: Config) -> Result<Self> {
        Parser::with_config(xml.as_bytes(), config).parse()
    }

    pub fn declaration(&self) -> &Declaration {
        &self.declaration
    }

    pub fn declaration_mut(&mut self) -> &mut Declaration {
        &mut self.declaration
    }

    /// Number of elements in the document, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub const fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root(&self) -> Node<'_> {
        Node::new(self, self.root_id())
    }

    pub fn root_mut(&mut self) -> NodeMut<'_> {
        let id = self.root_id();
        NodeMut::new(self, id)
    }

    /// Look up a node by id; `None` if this document never issued `id`
    pub fn node(&self, id: NodeId) -> Option<Node<'_>> {
        self.contains(id).then(|| Node::new(self, id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<NodeMut<'_>> {
        if self.contains(id) {
            Some(NodeMut::new(self, id))
        } else {
            None
        }
    }

    /// Node-path lookup starting at the root element.
    ///
    /// A single-segment path such as `"Child"` returns that child's text, so it
    /// is `None` for a child that only holds attributes or elements.
    pub fn node_path_value(&self, path: &str) -> Option<&str> {
        path::resolve(self, self.root_id(), path)
    }

    /// Node-path assignment starting at the root element
    pub fn set_node_path_value(&mut self, path: &str, value: impl Into<String>) -> Result<()> {
        let root = self.root_id();
        path::assign(self, root, path, value.into())
    }

    /// Serialize the declaration and the whole tree
    pub fn to_xml(&self, format: bool) -> String {
        writer::write_document(self, format)
    }

    fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    // Ids are only minted by `push_child` and the constructors, so every id
    // that reaches these accessors indexes into `nodes`.
    #[allow(clippy::indexing_slicing)]
    pub(crate) fn slot(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    #[allow(clippy::indexing_slicing)]
    pub(crate) fn slot_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    /// Append a new element under `parent`
    pub(crate) fn push_child(&mut self, parent: NodeId, name: String) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            name,
            parent: Some(parent),
            ..NodeData::default()
        });
        self.slot_mut(parent).children.push(id);
        id
    }

    /// Append a new element after checking its name
    pub(crate) fn add_child(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        check_name(name, "element")?;
        Ok(self.push_child(parent, name.to_string()))
    }

    /// First direct child of `parent` called `name`
    pub(crate) fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.slot(parent)
            .children
            .iter()
            .copied()
            .find(|&child| self.slot(child).name == name)
    }
}

/// Structural equality: declaration plus the element tree. Attribute order and
/// node ids do not take part.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.declaration == other.declaration && self.root() == other.root()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml(false))
    }
}

/// Whether `name` can be written as an element or attribute name and read back
pub fn is_valid_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(first) if is_name_start(first) => bytes.all(is_name_char),
        _ => false,
    }
}

/// `InvalidArgument` unless `name` passes [`is_valid_name`]
pub(crate) fn check_name(name: &str, what: &str) -> Result<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(Error::with_message(
            ErrorKind::InvalidArgument,
            Span::empty(),
            format!("invalid {what} name: {name:?}"),
        ))
    }
}

pub(crate) fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

pub(crate) fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}
