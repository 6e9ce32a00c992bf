//! XML serialization
//!
//! Compact output adds no whitespace at all. Formatted output puts every
//! element on its own line, indented with one tab per level; text stays on the
//! line of its element so it reads back unchanged.

use std::borrow::Cow;

use crate::xml::model::Document;
use crate::xml::node::Node;

pub(crate) fn write_document(doc: &Document, format: bool) -> String {
    let decl = doc.declaration();
    let mut out = format!(
        "<?xml version=\"{}\" encoding=\"{}\" standalone=\"{}\"?>",
        escape_attribute(&decl.version),
        escape_attribute(&decl.encoding),
        escape_attribute(&decl.standalone),
    );
    if format {
        out.push('\n');
    }
    write_element(&mut out, doc.root(), format, 0);
    out
}

pub(crate) fn write_node(node: Node<'_>, format: bool) -> String {
    let mut out = String::new();
    write_element(&mut out, node, format, 0);
    out
}

enum Step<'d> {
    Open {
        node: Node<'d>,
        depth: usize,
        format: bool,
        nested: bool,
    },
    Close {
        node: Node<'d>,
        depth: usize,
        format: bool,
    },
}

/// Write `node` and its subtree, driven by an explicit stack so that nesting
/// depth is bounded only by memory
fn write_element(out: &mut String, node: Node<'_>, format: bool, depth: usize) {
    let mut stack = vec![Step::Open {
        node,
        depth,
        format,
        nested: false,
    }];

    while let Some(step) = stack.pop() {
        match step {
            Step::Open {
                node,
                depth,
                format,
                nested,
            } => {
                if format {
                    if nested {
                        out.push('\n');
                    }
                    indent(out, depth);
                }
                out.push('<');
                out.push_str(node.name());
                for (name, value) in node.attributes() {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(value));
                    out.push('"');
                }

                let text = node.text();
                if text.is_none() && !node.has_children() {
                    out.push_str("/>");
                    continue;
                }

                out.push('>');
                if let Some(text) = text {
                    out.push_str(&escape_text(text));
                }
                // Mixed content is written inline; indentation would become part of the text
                let format = format && text.is_none();
                stack.push(Step::Close {
                    node,
                    depth,
                    format,
                });
                let children: Vec<Node<'_>> = node.children().collect();
                stack.extend(children.into_iter().rev().map(|child| Step::Open {
                    node: child,
                    depth: depth + 1,
                    format,
                    nested: true,
                }));
            }
            Step::Close {
                node,
                depth,
                format,
            } => {
                if format && node.has_children() {
                    out.push('\n');
                    indent(out, depth);
                }
                out.push_str("</");
                out.push_str(node.name());
                out.push('>');
            }
        }
    }
}

fn indent(out: &mut String, depth: usize) {
    out.extend(std::iter::repeat('\t').take(depth));
}

/// Escape character data: `&`, `<` and `>`
pub fn escape_text(input: &str) -> Cow<'_, str> {
    escape(input, false)
}

/// Escape an attribute value: `&`, `<`, `>`, `"` and `'`
pub fn escape_attribute(input: &str) -> Cow<'_, str> {
    escape(input, true)
}

fn escape(input: &str, quotes: bool) -> Cow<'_, str> {
    let needs_escape = |ch: char| match ch {
        '&' | '<' | '>' => true,
        '"' | '\'' => quotes,
        _ => false,
    };
    if !input.chars().any(needs_escape) {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len() + 8);
    for ch in input.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' if quotes => result.push_str("&quot;"),
            '\'' if quotes => result.push_str("&apos;"),
            _ => result.push(ch),
        }
    }
    Cow::Owned(result)
}
