//! Sparse equality matching.
//!
//! A predicate is every key field, then (for [`MatchScope::Full`]) every
//! attribute the descriptor carries, both in the family's declared order.
//! Attributes the caller left out never appear; explicit nulls become `IS NULL`.

use pxr_schemas::{RecordDescriptor, StoredRecord};
use tracing::debug;

use crate::{
    AdminChannel, MatchResult, Predicate, ReconcileError, Statement, StoreStage,
    MATCH_COUNT_COLUMN,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchScope {
    /// Natural key only. Used by existence checks and in-place updates.
    KeyOnly,
    /// Key plus every present attribute. Used by idempotency checks and deletes.
    Full,
}

pub fn build_predicate(desired: &RecordDescriptor, scope: MatchScope) -> Predicate {
    let mut predicate = Predicate::new();
    for (name, value) in desired.keys_in_order() {
        predicate.push(name, value);
    }
    if scope == MatchScope::Full {
        for (name, value) in desired.present_attributes() {
            predicate.push(name, value);
        }
    }
    predicate
}

pub fn count_statement(desired: &RecordDescriptor, scope: MatchScope) -> Statement {
    Statement::Count {
        table: desired.schema().table,
        predicate: build_predicate(desired, scope),
    }
}

pub fn select_statement(desired: &RecordDescriptor, scope: MatchScope) -> Statement {
    Statement::Select {
        table: desired.schema().table,
        predicate: build_predicate(desired, scope),
    }
}

pub async fn count_matching(
    channel: &dyn AdminChannel,
    desired: &RecordDescriptor,
    scope: MatchScope,
) -> Result<u64, ReconcileError> {
    let stmt = count_statement(desired, scope);
    let rows = channel
        .query(&stmt)
        .await
        .map_err(|e| ReconcileError::store(StoreStage::Read, &e))?;
    let count = parse_count(&rows)?;
    debug!(table = desired.schema().table, ?scope, matched = count, "count");
    Ok(count)
}

pub async fn fetch_matching(
    channel: &dyn AdminChannel,
    desired: &RecordDescriptor,
    scope: MatchScope,
) -> Result<Vec<StoredRecord>, ReconcileError> {
    let stmt = select_statement(desired, scope);
    let rows = channel
        .query(&stmt)
        .await
        .map_err(|e| ReconcileError::store(StoreStage::Read, &e))?;
    debug!(table = desired.schema().table, ?scope, rows = rows.len(), "fetch");
    Ok(rows)
}

/// Count and rows in one call. The count comes from the count statement, not
/// from `rows.len()`.
pub async fn match_state(
    channel: &dyn AdminChannel,
    desired: &RecordDescriptor,
    scope: MatchScope,
) -> Result<MatchResult, ReconcileError> {
    let count = count_matching(channel, desired, scope).await?;
    let rows = if count == 0 {
        Vec::new()
    } else {
        fetch_matching(channel, desired, scope).await?
    };
    Ok(MatchResult { count, rows })
}

fn parse_count(rows: &[StoredRecord]) -> Result<u64, ReconcileError> {
    let cell = rows
        .first()
        .and_then(|row| row.get(MATCH_COUNT_COLUMN))
        .and_then(|c| c.as_deref());
    let Some(text) = cell else {
        return Err(ReconcileError::Store {
            stage: StoreStage::Read,
            message: format!("count query returned no {MATCH_COUNT_COLUMN} column"),
        });
    };
    text.trim().parse::<u64>().map_err(|_| ReconcileError::Store {
        stage: StoreStage::Read,
        message: format!("count query returned non-numeric value '{text}'"),
    })
}
