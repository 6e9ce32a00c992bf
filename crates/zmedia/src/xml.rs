//! XML node trees with node-path addressing

mod cursor;
pub mod model;
pub mod node;
pub mod parser;
pub mod path;
pub mod writer;

pub use model::{is_valid_name, Declaration, Document, NodeId};
pub use node::{Node, NodeMut};
pub use parser::{Config, Parser};
pub use writer::{escape_attribute, escape_text};
