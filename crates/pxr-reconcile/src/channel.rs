//! Admin channel boundary.
//!
//! The engine never opens connections. The caller hands it something that can
//! run a [`Statement`] and return rows or an affected-row count. `pxr-db`
//! provides the MySQL-protocol implementation and `pxr-testkit` an in-memory one.

use std::fmt;

use async_trait::async_trait;
use pxr_schemas::StoredRecord;

use crate::Statement;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelError {
    /// Connection lost, timed out, or never established.
    Transport(String),
    /// The admin interface refused the statement. Carries its diagnostic text.
    Rejected(String),
}

impl ChannelError {
    pub fn diagnostic(&self) -> &str {
        match self {
            ChannelError::Transport(m) | ChannelError::Rejected(m) => m,
        }
    }

    /// `true` when the diagnostic reports a uniqueness violation.
    pub fn is_duplicate_key(&self) -> bool {
        match self {
            ChannelError::Rejected(m) => {
                m.contains("UNIQUE constraint failed") || m.contains("Duplicate entry")
            }
            ChannelError::Transport(_) => false,
        }
    }
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::Transport(m) => write!(f, "transport error: {m}"),
            ChannelError::Rejected(m) => write!(f, "statement rejected: {m}"),
        }
    }
}

impl std::error::Error for ChannelError {}

// ---------------------------------------------------------------------------
// Channel trait
// ---------------------------------------------------------------------------

/// Request/response execution against the admin interface.
///
/// Implementations must be object-safe (`&dyn AdminChannel`) and must execute
/// statements in call order.
#[async_trait]
pub trait AdminChannel: Send + Sync {
    /// Run a row-returning statement (`Count`, `Select`).
    async fn query(&self, stmt: &Statement) -> Result<Vec<StoredRecord>, ChannelError>;

    /// Run a mutating statement or admin command; returns rows affected.
    async fn execute(&self, stmt: &Statement) -> Result<u64, ChannelError>;
}
