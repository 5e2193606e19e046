//! Module: value
//! Responsibility: the `Cell` value model read from shard cursors.
//! Does not own: ordering policy across keys (see `merge::compare`).
//! Boundary: per-cell comparison, equality and hashing primitives.

mod compare;
mod hash;


use serde::{Deserialize, Serialize};
use std::fmt;

// re-exports
pub use compare::{TextMode, compare_cells};
pub(crate) use compare::cells_group_eq;
pub(crate) use hash::{StableHash, stable_hash_cells};

///
/// Cell
///
/// One column value of one shard row.
///
/// Null      → SQL NULL.
/// Date      → days since the Unix epoch.
/// Timestamp → microseconds since the Unix epoch.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
    Date(i32),
    Timestamp(i64),
}

impl Cell {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Comparison family of this cell.
    ///
    /// Cells from different families never compare; integer, unsigned and
    /// float cells share the numeric family.
    #[must_use]
    pub const fn family(&self) -> CellFamily {
        match self {
            Self::Null => CellFamily::Null,
            Self::Bool(_) => CellFamily::Bool,
            Self::Int(_) | Self::Uint(_) | Self::Float(_) => CellFamily::Numeric,
            Self::Text(_) => CellFamily::Text,
            Self::Blob(_) => CellFamily::Blob,
            Self::Date(_) => CellFamily::Date,
            Self::Timestamp(_) => CellFamily::Timestamp,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Uint(value) => i64::try_from(*value).ok(),
            _ => None,
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Uint(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Uint(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value}"),
            Self::Blob(bytes) => write!(f, "<{} bytes>", bytes.len()),
            Self::Date(days) => write!(f, "date({days})"),
            Self::Timestamp(micros) => write!(f, "ts({micros})"),
        }
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for Cell {
    fn from(value: u64) -> Self {
        Self::Uint(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for Cell {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

///
/// CellFamily
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CellFamily {
    Null,
    Bool,
    Numeric,
    Text,
    Blob,
    Date,
    Timestamp,
}

impl CellFamily {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::Blob => "blob",
            Self::Date => "date",
            Self::Timestamp => "timestamp",
        }
    }
}
