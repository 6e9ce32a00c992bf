//! Boolean selection trees over raw SQL fragments

use std::fmt;

/// Connective joining two clauses
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "UPPERCASE")
)]
pub enum Operator {
    And,
    Or,
}

impl Operator {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selection string plus the positional arguments for its `?` placeholders
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Selection {
    pub selection: String,
    pub args: Vec<String>,
}

/// A WHERE clause built from raw fragments.
///
/// Leaves are SQL fragments such as `"artist = ?"` with their arguments.
/// Combining two clauses wraps both in a new [`WhereClause::Aggregate`] that
/// always renders fully parenthesized, so no precedence rules are involved:
///
/// ```
/// use zmedia::WhereClause;
///
/// let clause = WhereClause::create("a = ?", ["1"])
///     .or_where("b = ?", ["2"])
///     .and("c");
/// assert_eq!(clause.selection(), "((a = ? OR b = ?) AND c)");
/// assert_eq!(clause.selection_args(), ["1", "2"]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WhereClause {
    Condition {
        fragment: String,
        args: Vec<String>,
    },
    Aggregate {
        left: Box<WhereClause>,
        operator: Operator,
        right: Box<WhereClause>,
    },
}

impl WhereClause {
    /// Leaf clause with positional arguments
    pub fn create<I>(fragment: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::Condition {
            fragment: fragment.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Leaf clause without arguments
    pub fn condition(fragment: impl Into<String>) -> Self {
        Self::Condition {
            fragment: fragment.into(),
            args: Vec::new(),
        }
    }

    pub fn aggregate(left: Self, operator: Operator, right: Self) -> Self {
        Self::Aggregate {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    /// `(left AND right)`
    pub fn both(left: impl Into<Self>, right: impl Into<Self>) -> Self {
        Self::aggregate(left.into(), Operator::And, right.into())
    }

    /// `(left OR right)`
    pub fn either(left: impl Into<Self>, right: impl Into<Self>) -> Self {
        Self::aggregate(left.into(), Operator::Or, right.into())
    }

    /// Left fold of `clauses` with AND; `None` when there are none
    pub fn all<I>(clauses: I) -> Option<Self>
    where
        I: IntoIterator,
        I::Item: Into<Self>,
    {
        Self::fold(clauses, Operator::And)
    }

    /// Left fold of `clauses` with OR; `None` when there are none
    pub fn any<I>(clauses: I) -> Option<Self>
    where
        I: IntoIterator,
        I::Item: Into<Self>,
    {
        Self::fold(clauses, Operator::Or)
    }

    fn fold<I>(clauses: I, operator: Operator) -> Option<Self>
    where
        I: IntoIterator,
        I::Item: Into<Self>,
    {
        clauses
            .into_iter()
            .map(Into::into)
            .reduce(|acc, next| Self::aggregate(acc, operator, next))
    }

    #[must_use]
    pub fn and(self, other: impl Into<Self>) -> Self {
        Self::both(self, other)
    }

    #[must_use]
    pub fn or(self, other: impl Into<Self>) -> Self {
        Self::either(self, other)
    }

    /// `self AND fragment`, wrapping the fragment in a leaf first
    #[must_use]
    pub fn and_where<I>(self, fragment: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.and(Self::create(fragment, args))
    }

    /// `self OR fragment`, wrapping the fragment in a leaf first
    #[must_use]
    pub fn or_where<I>(self, fragment: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.or(Self::create(fragment, args))
    }

    /// Render the selection string
    pub fn selection(&self) -> String {
        let mut out = String::new();
        self.write_selection(&mut out);
        out
    }

    fn write_selection(&self, out: &mut String) {
        match self {
            Self::Condition { fragment, .. } => out.push_str(fragment),
            Self::Aggregate {
                left,
                operator,
                right,
            } => {
                out.push('(');
                left.write_selection(out);
                out.push(' ');
                out.push_str(operator.as_str());
                out.push(' ');
                right.write_selection(out);
                out.push(')');
            }
        }
    }

    /// Arguments of every leaf, left to right, in placeholder order
    pub fn selection_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        self.collect_args(&mut args);
        args
    }

    fn collect_args(&self, out: &mut Vec<String>) {
        match self {
            Self::Condition { args, .. } => out.extend(args.iter().cloned()),
            Self::Aggregate { left, right, .. } => {
                left.collect_args(out);
                right.collect_args(out);
            }
        }
    }

    pub fn to_selection(&self) -> Selection {
        Selection {
            selection: self.selection(),
            args: self.selection_args(),
        }
    }

    /// Number of leaf conditions in the tree
    pub fn condition_count(&self) -> usize {
        match self {
            Self::Condition { .. } => 1,
            Self::Aggregate { left, right, .. } => left.condition_count() + right.condition_count(),
        }
    }
}

impl From<&str> for WhereClause {
    fn from(fragment: &str) -> Self {
        Self::condition(fragment)
    }
}

impl From<String> for WhereClause {
    fn from(fragment: String) -> Self {
        Self::condition(fragment)
    }
}

impl From<WhereClause> for Selection {
    fn from(clause: WhereClause) -> Self {
        clause.to_selection()
    }
}

impl fmt::Display for WhereClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.selection())
    }
}
