//! Node paths: `/`-separated element names, optionally ending in `@attribute`
//!
//! `Player/Queue/@Position` addresses the `Position` attribute of the first
//! `Queue` child of the first `Player` child. `Player/Title` addresses the
//! text of the first `Title` child of `Player`. A lone `@Version` reads an
//! attribute of the node the lookup starts from.

use tracing::trace;

use crate::error::{Error, ErrorKind, Result};
use crate::xml::model::{check_name, Document, NodeId};

/// What the last path segment points at
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Terminal<'p> {
    Attribute(&'p str),
    Text(&'p str),
}

#[derive(Debug)]
struct NodePath<'p> {
    parents: Vec<&'p str>,
    terminal: Terminal<'p>,
}

impl<'p> NodePath<'p> {
    fn parse(path: &'p str) -> Option<Self> {
        if path.is_empty() {
            return None;
        }
        let mut parents: Vec<&str> = path.split('/').collect();
        let last = parents.pop()?;
        let terminal = match last.strip_prefix('@') {
            Some(attribute) => Terminal::Attribute(attribute),
            None => Terminal::Text(last),
        };
        Some(Self { parents, terminal })
    }

    fn is_well_formed(&self) -> bool {
        let terminal = match self.terminal {
            Terminal::Attribute(name) | Terminal::Text(name) => name,
        };
        !terminal.is_empty() && self.parents.iter().all(|segment| !segment.is_empty())
    }
}

/// Resolve `path` starting at `from`, creating nothing.
///
/// Returns `None` for an empty path or when any element along the way is
/// missing. A final element segment yields that element's text, so a path
/// naming an element without text (`"Child"` when `Child` only holds
/// attributes or children) is `None` as well.
pub(crate) fn resolve<'d>(doc: &'d Document, from: NodeId, path: &str) -> Option<&'d str> {
    let path = NodePath::parse(path)?;
    let mut current = from;
    for segment in &path.parents {
        current = doc.find_child(current, segment)?;
    }
    match path.terminal {
        Terminal::Attribute(name) => doc.slot(current).attributes.get(name).map(String::as_str),
        Terminal::Text(name) => {
            let node = doc.find_child(current, name)?;
            doc.slot(node).text.as_deref()
        }
    }
}

/// Assign `value` at `path` starting at `from`, appending any missing elements
pub(crate) fn assign(doc: &mut Document, from: NodeId, path: &str, value: String) -> Result<()> {
    let parsed = NodePath::parse(path)
        .filter(NodePath::is_well_formed)
        .ok_or_else(|| {
            Error::unpositioned(ErrorKind::InvalidPath {
                path: path.to_string(),
            })
        })?;

    let mut current = from;
    for segment in &parsed.parents {
        current = child_or_create(doc, current, segment)?;
    }
    match parsed.terminal {
        Terminal::Attribute(name) => {
            check_name(name, "attribute")?;
            doc.slot_mut(current)
                .attributes
                .insert(name.to_string(), value);
        }
        Terminal::Text(name) => {
            let node = child_or_create(doc, current, name)?;
            doc.slot_mut(node).text = Some(value);
        }
    }
    Ok(())
}

fn child_or_create(doc: &mut Document, parent: NodeId, name: &str) -> Result<NodeId> {
    match doc.find_child(parent, name) {
        Some(child) => Ok(child),
        None => {
            trace!(name, "creating element for node path");
            doc.add_child(parent, name)
        }
    }
}
