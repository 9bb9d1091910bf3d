use std::fmt;

use crate::FieldKind;

/// Reasons a desired-record descriptor (or a protocol token) is rejected.
///
/// All of these are raised before the admin interface is contacted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaError {
    UnknownField {
        family: &'static str,
        field: String,
    },
    MissingKey {
        family: &'static str,
        field: &'static str,
    },
    NullKey {
        family: &'static str,
        field: &'static str,
    },
    KindMismatch {
        field: &'static str,
        expected: FieldKind,
    },
    NotNullable {
        field: &'static str,
    },
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    UnknownToken {
        what: &'static str,
        raw: String,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::UnknownField { family, field } => {
                write!(f, "{family} has no field named '{field}'")
            }
            SchemaError::MissingKey { family, field } => {
                write!(f, "{family} requires key field '{field}'")
            }
            SchemaError::NullKey { family, field } => {
                write!(f, "{family} key field '{field}' cannot be null")
            }
            SchemaError::KindMismatch { field, expected } => {
                write!(f, "field '{field}' expects a {} value", expected.as_str())
            }
            SchemaError::NotNullable { field } => {
                write!(f, "field '{field}' cannot be set to null")
            }
            SchemaError::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{field} must be between {min} and {max} (got {value})"),
            SchemaError::UnknownToken { what, raw } => write!(f, "unrecognised {what} '{raw}'"),
        }
    }
}

impl std::error::Error for SchemaError {}
