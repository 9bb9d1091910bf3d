//! CRUD primitives over one record family, generic over the family schema.

use pxr_schemas::{RecordDescriptor, StoredRecord};
use tracing::debug;

use crate::matcher::{build_predicate, count_matching, fetch_matching, match_state, MatchScope};
use crate::{AdminChannel, MatchResult, ReconcileError, Statement, StoreStage};

/// Borrowed view over an admin channel. Holds no state of its own.
#[derive(Clone, Copy)]
pub struct RecordRepository<'a> {
    channel: &'a dyn AdminChannel,
}

impl<'a> RecordRepository<'a> {
    pub fn new(channel: &'a dyn AdminChannel) -> Self {
        Self { channel }
    }

    /// A row carrying the natural key exists.
    pub async fn exists(&self, desired: &RecordDescriptor) -> Result<bool, ReconcileError> {
        Ok(count_matching(self.channel, desired, MatchScope::KeyOnly).await? > 0)
    }

    /// A row matches the key and every present attribute (idempotency check).
    pub async fn matches_desired(&self, desired: &RecordDescriptor) -> Result<bool, ReconcileError> {
        Ok(self.count_desired(desired).await? > 0)
    }

    pub async fn count_desired(&self, desired: &RecordDescriptor) -> Result<u64, ReconcileError> {
        count_matching(self.channel, desired, MatchScope::Full).await
    }

    /// Full-predicate count plus the matching rows, fetched only when the
    /// count is non-zero.
    pub async fn match_desired(
        &self,
        desired: &RecordDescriptor,
    ) -> Result<MatchResult, ReconcileError> {
        match_state(self.channel, desired, MatchScope::Full).await
    }

    /// First row carrying the natural key.
    pub async fn fetch(
        &self,
        desired: &RecordDescriptor,
    ) -> Result<Option<StoredRecord>, ReconcileError> {
        let rows = fetch_matching(self.channel, desired, MatchScope::KeyOnly).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn fetch_desired(
        &self,
        desired: &RecordDescriptor,
    ) -> Result<Vec<StoredRecord>, ReconcileError> {
        fetch_matching(self.channel, desired, MatchScope::Full).await
    }

    /// Inserts key fields plus present attributes. Absent attributes take the
    /// store's column defaults.
    pub async fn insert(&self, desired: &RecordDescriptor) -> Result<StoredRecord, ReconcileError> {
        let columns = desired
            .keys_in_order()
            .into_iter()
            .chain(desired.present_attributes())
            .map(|(name, value)| (name, value.clone()))
            .collect();
        let stmt = Statement::Insert {
            table: desired.schema().table,
            columns,
        };

        self.channel.execute(&stmt).await.map_err(|e| {
            if e.is_duplicate_key() {
                ReconcileError::Conflict {
                    message: format!(
                        "{} \"{}\" already exists in {}: {}",
                        desired.schema().noun,
                        desired.label(),
                        desired.schema().table,
                        e.diagnostic()
                    ),
                }
            } else {
                ReconcileError::store(StoreStage::Write, &e)
            }
        })?;
        debug!(table = desired.schema().table, "insert");

        self.fetch_desired(desired)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| not_visible(desired, "insert"))
    }

    /// Writes only present attributes, matched by natural key.
    pub async fn update(&self, desired: &RecordDescriptor) -> Result<StoredRecord, ReconcileError> {
        let assignments: Vec<_> = desired
            .present_attributes()
            .into_iter()
            .map(|(name, value)| (name, value.clone()))
            .collect();

        if !assignments.is_empty() {
            let stmt = Statement::Update {
                table: desired.schema().table,
                assignments,
                predicate: build_predicate(desired, MatchScope::KeyOnly),
            };
            let rows = self
                .channel
                .execute(&stmt)
                .await
                .map_err(|e| ReconcileError::store(StoreStage::Write, &e))?;
            debug!(table = desired.schema().table, rows, "update");
        }

        self.fetch(desired)
            .await?
            .ok_or_else(|| not_visible(desired, "update"))
    }

    /// Deletes every row matching the full predicate; returns rows removed.
    pub async fn delete(&self, desired: &RecordDescriptor) -> Result<u64, ReconcileError> {
        let stmt = Statement::Delete {
            table: desired.schema().table,
            predicate: build_predicate(desired, MatchScope::Full),
        };
        let rows = self
            .channel
            .execute(&stmt)
            .await
            .map_err(|e| ReconcileError::store(StoreStage::Write, &e))?;
        debug!(table = desired.schema().table, rows, "delete");
        Ok(rows)
    }
}

fn not_visible(desired: &RecordDescriptor, op: &str) -> ReconcileError {
    ReconcileError::Store {
        stage: StoreStage::Read,
        message: format!(
            "{} \"{}\" not visible in {} after {op}",
            desired.schema().noun,
            desired.label(),
            desired.schema().table
        ),
    }
}
