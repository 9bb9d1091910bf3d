use pxr_schemas::StoredRecord;
use serde::{Deserialize, Serialize};

/// Cardinality plus (optionally) the matching rows. `count` drives branching.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchResult {
    pub count: u64,
    pub rows: Vec<StoredRecord>,
}

/// Requested end state for the desired record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    Present,
    Absent,
}

/// What the store looks like relative to the desired record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordState {
    /// No row carries the key fields.
    Absent,
    /// Exactly one row matches keys and every present attribute.
    PresentMatching,
    /// A row carries the key fields but some present attribute differs.
    PresentDivergent,
    /// More than one row matches the full predicate.
    PresentAmbiguous { matched: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Noop,
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Noop => "noop",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    pub fn is_mutation(&self) -> bool {
        !matches!(self, Action::Noop)
    }
}

/// Record(s) echoed back to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Affected {
    One(StoredRecord),
    Many(Vec<StoredRecord>),
}

/// Result of one reconcile call, handed to the result sink.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub family: &'static str,
    pub action: Action,
    pub changed: bool,
    pub dry_run: bool,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected: Option<Affected>,
    /// Admin commands issued after the mutation, in order.
    pub propagated: Vec<String>,
    pub rows_affected: u64,
}

/// Result of one bulk layer transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    /// Always `true`: the admin protocol does not report whether a bulk
    /// transfer altered anything.
    pub changed: bool,
    pub dry_run: bool,
    pub msg: String,
    pub commands: Vec<String>,
}
