//! Borrowed handles onto the elements of a [`Document`]

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ErrorKind, Result};
use crate::xml::model::{check_name, Document, NodeData, NodeId};
use crate::xml::path;
use crate::xml::writer;

/// Read-only view of one element
#[derive(Clone, Copy)]
pub struct Node<'d> {
    doc: &'d Document,
    id: NodeId,
}

impl<'d> Node<'d> {
    pub(crate) fn new(doc: &'d Document, id: NodeId) -> Self {
        Self { doc, id }
    }

    fn data(&self) -> &'d NodeData {
        self.doc.slot(self.id)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Document that owns this node
    pub fn document(&self) -> &'d Document {
        self.doc
    }

    pub fn name(&self) -> &'d str {
        &self.data().name
    }

    pub fn attribute(&self, name: &str) -> Option<&'d str> {
        self.data().attributes.get(name).map(String::as_str)
    }

    /// Attributes in insertion order
    pub fn attributes(&self) -> impl Iterator<Item = (&'d str, &'d str)> + 'd {
        self.data()
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Text content; `None` when no text was ever set (`<a/>`), `Some("")`
    /// for an explicitly empty element (`<a></a>`)
    pub fn text(&self) -> Option<&'d str> {
        self.data().text.as_deref()
    }

    pub fn has_children(&self) -> bool {
        !self.data().children.is_empty()
    }

    /// All direct children in document order
    pub fn children(&self) -> impl Iterator<Item = Node<'d>> + 'd {
        let doc = self.doc;
        self.data()
            .children
            .iter()
            .map(move |&id| Node::new(doc, id))
    }

    /// First direct child called `name`
    pub fn child_node(&self, name: &str) -> Option<Node<'d>> {
        self.doc
            .find_child(self.id, name)
            .map(|id| Node::new(self.doc, id))
    }

    /// Every direct child called `name`, in document order
    pub fn child_nodes(&self, name: &str) -> Vec<Node<'d>> {
        self.children().filter(|child| child.name() == name).collect()
    }

    /// Enclosing element; `None` only for the document root
    pub fn parent_node(&self) -> Option<Node<'d>> {
        self.data().parent.map(|id| Node::new(self.doc, id))
    }

    /// Walks parent links up to the document root
    pub fn root_node(&self) -> Node<'d> {
        let mut node = *self;
        while let Some(parent) = node.parent_node() {
            node = parent;
        }
        node
    }

    /// Number of ancestors between this node and the root
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut node = *self;
        while let Some(parent) = node.parent_node() {
            depth += 1;
            node = parent;
        }
        depth
    }

    /// Resolve a node path relative to this node; see [`crate::xml::path`].
    ///
    /// A single-segment path returns the text of that child, not the child.
    pub fn node_path_value(&self, path: &str) -> Option<&'d str> {
        path::resolve(self.doc, self.id, path)
    }

    /// Read an attribute and parse it.
    ///
    /// `Ok(None)` when the attribute is absent, an `InvalidValue` error when it
    /// is present but does not parse as `T`.
    pub fn parse_attribute<T: FromStr>(&self, name: &str) -> Result<Option<T>> {
        self.attribute(name).map(parse_value).transpose()
    }

    /// Resolve a node path and parse the value found there
    pub fn parse_node_path_value<T: FromStr>(&self, path: &str) -> Result<Option<T>> {
        self.node_path_value(path).map(parse_value).transpose()
    }

    /// Serialize this subtree without an XML declaration
    pub fn to_xml(&self, format: bool) -> String {
        writer::write_node(*self, format)
    }
}

fn parse_value<T: FromStr>(raw: &str) -> Result<T> {
    raw.parse().map_err(|_| {
        Error::unpositioned(ErrorKind::InvalidValue {
            value: raw.to_string(),
        })
    })
}

/// Structural equality: name, attributes (in any order), text and children.
/// Walks both subtrees with an explicit stack, so depth is unbounded.
impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(*self, *other)];
        while let Some((left, right)) = pending.pop() {
            let (a, b) = (left.data(), right.data());
            if a.name != b.name
                || a.attributes != b.attributes
                || a.text != b.text
                || a.children.len() != b.children.len()
            {
                return false;
            }
            pending.extend(left.children().zip(right.children()));
        }
        true
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("attributes", &self.data().attributes)
            .field("text", &self.text())
            .field("children", &self.data().children.len())
            .finish()
    }
}

impl fmt::Display for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml(false))
    }
}

/// Exclusive view of one element, used for every mutation of the tree
pub struct NodeMut<'d> {
    doc: &'d mut Document,
    id: NodeId,
}

impl<'d> NodeMut<'d> {
    pub(crate) fn new(doc: &'d mut Document, id: NodeId) -> Self {
        Self { doc, id }
    }

    fn data(&mut self) -> &mut NodeData {
        self.doc.slot_mut(self.id)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Read-only view of the same node
    pub fn as_node(&self) -> Node<'_> {
        Node::new(self.doc, self.id)
    }

    pub fn name(&self) -> &str {
        &self.doc.slot(self.id).name
    }

    /// Append a new, empty child element and return it.
    ///
    /// Fails with `InvalidArgument` when `name` is empty or not a valid
    /// element name.
    pub fn add_child_node(&mut self, name: &str) -> Result<NodeMut<'_>> {
        let child = self.doc.add_child(self.id, name)?;
        Ok(NodeMut::new(self.doc, child))
    }

    /// First direct child called `name`
    pub fn child_node_mut(&mut self, name: &str) -> Option<NodeMut<'_>> {
        let child = self.doc.find_child(self.id, name)?;
        Some(NodeMut::new(self.doc, child))
    }

    pub fn parent_node_mut(&mut self) -> Option<NodeMut<'_>> {
        let parent = self.doc.slot(self.id).parent?;
        Some(NodeMut::new(self.doc, parent))
    }

    /// Consume this handle and move to the child called `name`
    pub fn into_child_node(self, name: &str) -> Option<NodeMut<'d>> {
        let child = self.doc.find_child(self.id, name)?;
        Some(NodeMut::new(self.doc, child))
    }

    /// Set or replace an attribute; a replaced attribute keeps its position.
    ///
    /// Fails with `InvalidArgument` when `name` is not a valid attribute name,
    /// leaving the node untouched.
    pub fn set_attribute(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<&mut Self> {
        let name = name.into();
        check_name(&name, "attribute")?;
        self.data().attributes.insert(name, value.into());
        Ok(self)
    }

    /// Remove an attribute, returning its previous value.
    ///
    /// Later attributes keep their relative order.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.data().attributes.shift_remove(name)
    }

    pub fn set_node_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.data().text = Some(text.into());
        self
    }

    /// Drop the text content, so the element serializes as `<Name/>` again
    /// when it has no children
    pub fn clear_node_text(&mut self) -> Option<String> {
        self.data().text.take()
    }

    /// Assign a node-path value relative to this node, creating missing
    /// elements on the way
    pub fn set_node_path_value(&mut self, path: &str, value: impl Into<String>) -> Result<()> {
        path::assign(self.doc, self.id, path, value.into())
    }
}

impl fmt::Debug for NodeMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.as_node(), f)
    }
}
