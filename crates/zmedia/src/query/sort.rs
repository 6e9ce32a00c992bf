//! Multi-key ORDER BY clauses

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ErrorKind};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "UPPERCASE")
)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else {
            Err(Error::unpositioned(ErrorKind::InvalidValue {
                value: s.to_string(),
            }))
        }
    }
}

/// One `field DIRECTION` pair
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.direction)
    }
}

/// Ordered list of sort keys, rendered as `field1 DIR1, field2 DIR2, ...`
///
/// ```
/// use zmedia::{SortClause, SortDirection};
///
/// let order = SortClause::create("album", SortDirection::Desc)
///     .then_by_asc("track");
/// assert_eq!(order.to_sql(), "album DESC, track ASC");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortClause {
    keys: Vec<SortKey>,
}

impl SortClause {
    pub fn create(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            keys: vec![SortKey {
                field: field.into(),
                direction,
            }],
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::create(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::create(field, SortDirection::Desc)
    }

    /// Append a key after the existing ones
    #[must_use]
    pub fn then_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.push(field, direction);
        self
    }

    #[must_use]
    pub fn then_by_asc(self, field: impl Into<String>) -> Self {
        self.then_by(field, SortDirection::Asc)
    }

    /// Append a key in place, for clauses assembled in a loop
    pub fn push(&mut self, field: impl Into<String>, direction: SortDirection) {
        self.keys.push(SortKey {
            field: field.into(),
            direction,
        });
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Same keys with every direction flipped
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            keys: self
                .keys
                .iter()
                .map(|key| SortKey {
                    field: key.field.clone(),
                    direction: key.direction.reversed(),
                })
                .collect(),
        }
    }

    pub fn to_sql(&self) -> String {
        self.keys
            .iter()
            .map(SortKey::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for SortClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
