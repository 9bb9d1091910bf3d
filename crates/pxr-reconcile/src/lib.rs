//! pxr-reconcile
//!
//! Desired-state reconciliation against the ProxySQL admin interface.
//!
//! - Sparse matching: absent attributes never reach a predicate
//! - Ensure-absent refuses to delete more than one row unless forced
//! - Dry run decides exactly as a live run would, then stops before writing
//! - Propagation is SAVE TO DISK, then LOAD TO RUNTIME, after a mutation only
//! - Bulk layer transfers are checked against a fixed legality table
//!
//! No concrete IO. Callers pass an [`AdminChannel`].

mod channel;
mod error;
mod statement;
mod types;

pub mod engine;
pub mod matcher;
pub mod propagate;
pub mod repository;
pub mod transfer;

pub use channel::{AdminChannel, ChannelError};
pub use engine::{ensure_absent, ensure_present, lookup, reconcile, ReconcileOptions};
pub use error::{ReconcileError, StoreStage};
pub use matcher::MatchScope;
pub use propagate::Propagation;
pub use repository::RecordRepository;
pub use statement::{Condition, Predicate, Statement, MATCH_COUNT_COLUMN};
pub use transfer::{
    simulate_transfer, transfer, validate_transfer, TransferRequest, LEGAL_TRANSFERS,
};
pub use types::*;
