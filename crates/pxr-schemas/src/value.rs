//! Field values as they travel between a desired-record descriptor and the
//! admin interface.
//!
//! The admin interface hands every cell back as text (or SQL NULL), so
//! comparison against a stored row always goes through [`FieldValue::canonical_text`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A row returned by the admin interface: column name -> text cell (`None` is NULL).
pub type StoredRecord = BTreeMap<String, Option<String>>;

/// Declared kind of a column in a record family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Int,
    Bool,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Int => "int",
            FieldKind::Bool => "bool",
        }
    }
}

/// A single desired value.
///
/// `Null` is the explicit-null marker. A caller that has no opinion about a
/// field leaves it out of the descriptor entirely; it never uses `Null` for that.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Text(String),
    Null,
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Kind of a non-null value.
    pub fn kind(&self) -> Option<FieldKind> {
        match self {
            FieldValue::Bool(_) => Some(FieldKind::Bool),
            FieldValue::Int(_) => Some(FieldKind::Int),
            FieldValue::Text(_) => Some(FieldKind::Text),
            FieldValue::Null => None,
        }
    }

    /// Text form the admin interface stores for this value.
    /// Booleans are stored as `1` / `0`.
    pub fn canonical_text(&self) -> Option<String> {
        match self {
            FieldValue::Bool(true) => Some("1".to_string()),
            FieldValue::Bool(false) => Some("0".to_string()),
            FieldValue::Int(n) => Some(n.to_string()),
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Null => None,
        }
    }

    /// Equality against a stored cell. `Null` only matches a NULL cell.
    pub fn matches_cell(&self, cell: Option<&str>) -> bool {
        match (self.canonical_text(), cell) {
            (None, None) => true,
            (Some(want), Some(got)) => want == got,
            _ => false,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.canonical_text() {
            Some(s) => f.write_str(&s),
            None => f.write_str("NULL"),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(i64::from(v))
    }
}

impl From<u16> for FieldValue {
    fn from(v: u16) -> Self {
        FieldValue::Int(i64::from(v))
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}
