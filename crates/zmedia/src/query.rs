//! Selection and ordering builders for media-library queries
//!
//! Both builders only produce strings; handing them to a query layer is up to
//! the caller.

pub mod sort;
pub mod where_clause;

pub use sort::{SortClause, SortDirection, SortKey};
pub use where_clause::{Operator, Selection, WhereClause};
