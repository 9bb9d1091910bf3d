use std::fmt;

use pxr_schemas::SchemaError;

use crate::ChannelError;

/// Which round-trip failed. Carried by [`ReconcileError::Store`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreStage {
    Connect,
    Read,
    Write,
    Propagate,
}

impl StoreStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreStage::Connect => "connect",
            StoreStage::Read => "read",
            StoreStage::Write => "write",
            StoreStage::Propagate => "propagate",
        }
    }
}

/// Terminal failure of one reconcile or transfer call.
///
/// `Validation` is always raised before the admin interface is touched.
/// `Cardinality` guarantees no mutation was attempted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileError {
    Validation { message: String },
    NotFound { message: String },
    Cardinality { matched: u64, message: String },
    Conflict { message: String },
    Store { stage: StoreStage, message: String },
}

impl ReconcileError {
    pub fn validation(message: impl Into<String>) -> Self {
        ReconcileError::Validation {
            message: message.into(),
        }
    }

    pub fn store(stage: StoreStage, err: &ChannelError) -> Self {
        ReconcileError::Store {
            stage,
            message: err.to_string(),
        }
    }

    /// Stable machine-readable prefix.
    pub fn code(&self) -> &'static str {
        match self {
            ReconcileError::Validation { .. } => "VALIDATION_ERROR",
            ReconcileError::NotFound { .. } => "NOT_FOUND",
            ReconcileError::Cardinality { .. } => "CARDINALITY_ERROR",
            ReconcileError::Conflict { .. } => "CONFLICT",
            ReconcileError::Store { .. } => "STORE_ERROR",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ReconcileError::Validation { message }
            | ReconcileError::NotFound { message }
            | ReconcileError::Cardinality { message, .. }
            | ReconcileError::Conflict { message }
            | ReconcileError::Store { message, .. } => message,
        }
    }
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileError::Store { stage, message } => {
                write!(f, "STORE_ERROR stage={}: {message}", stage.as_str())
            }
            other => write!(f, "{}: {}", other.code(), other.message()),
        }
    }
}

impl std::error::Error for ReconcileError {}

impl From<SchemaError> for ReconcileError {
    fn from(e: SchemaError) -> Self {
        ReconcileError::validation(e.to_string())
    }
}
