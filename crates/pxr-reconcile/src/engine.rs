//! Reconciliation engine.
//!
//! Read, decide, act, propagate. Deciding is pure ([`classify`],
//! [`plan_present`], [`plan_absent`]); the async functions only gather the
//! counts those need and carry out the chosen action. Each call performs at
//! most one mutating statement before propagation.

use pxr_schemas::{RecordDescriptor, RecordFamilySchema, StoredRecord};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::propagate::{propagate, Propagation};
use crate::repository::RecordRepository;
use crate::{
    Action, AdminChannel, Affected, DesiredState, MatchResult, ReconcileError, ReconcileOutcome,
    RecordState,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOptions {
    /// Report the action a live run would take without mutating.
    pub dry_run: bool,
    /// Allow a delete that matches more than one row.
    pub force_delete: bool,
    pub propagation: Propagation,
}

// ---------------------------------------------------------------------------
// Pure decision logic
// ---------------------------------------------------------------------------

/// Store state from an existence check and a full-predicate count.
pub fn classify(exists: bool, matched: u64) -> RecordState {
    match (exists, matched) {
        (false, _) => RecordState::Absent,
        (true, 0) => RecordState::PresentDivergent,
        (true, 1) => RecordState::PresentMatching,
        (true, n) => RecordState::PresentAmbiguous { matched: n },
    }
}

pub fn plan_present(
    schema: &RecordFamilySchema,
    state: RecordState,
    desired: &RecordDescriptor,
) -> Result<Action, ReconcileError> {
    match state {
        RecordState::Absent if schema.insertable => Ok(Action::Create),
        RecordState::Absent => Err(not_found(desired)),
        RecordState::PresentMatching | RecordState::PresentAmbiguous { .. } => Ok(Action::Noop),
        // Without a uniqueness constraint there is no single row to update;
        // the divergent desired record is a new row.
        RecordState::PresentDivergent if schema.unique_key => Ok(Action::Update),
        RecordState::PresentDivergent => Ok(Action::Create),
    }
}

pub fn plan_absent(matched: u64, force_delete: bool) -> Result<Action, ReconcileError> {
    match matched {
        0 => Ok(Action::Noop),
        1 => Ok(Action::Delete),
        n if force_delete => {
            info!(matched = n, "force_delete set, deleting every match");
            Ok(Action::Delete)
        }
        n => Err(ReconcileError::Cardinality {
            matched: n,
            message: "Operation would delete multiple records use force_delete to override this"
                .to_string(),
        }),
    }
}

fn not_found(desired: &RecordDescriptor) -> ReconcileError {
    ReconcileError::NotFound {
        message: format!(
            "The {} \"{}\" was not found",
            desired.schema().noun,
            desired.label()
        ),
    }
}

fn message(
    schema: &RecordFamilySchema,
    intent: DesiredState,
    action: Action,
    dry_run: bool,
) -> String {
    let noun = schema.noun;
    let table = schema.table;
    let (past, participle, prep) = match action {
        Action::Create => ("Added", "added", "to"),
        Action::Update => ("Updated", "updated", "in"),
        Action::Delete => ("Deleted", "deleted", "from"),
        Action::Noop => {
            return match intent {
                DesiredState::Present => format!(
                    "The {noun} already exists in {table} and doesn't need to be updated."
                ),
                DesiredState::Absent => {
                    format!("The {noun} is already absent from the {table} memory configuration")
                }
            }
        }
    };
    if dry_run {
        format!(
            "{} would have been {participle} {prep} {table}, however dry run is enabled.",
            schema.noun_capitalized()
        )
    } else {
        format!("{past} {noun} {prep} {table}")
    }
}

fn echo(schema: &RecordFamilySchema, rows: Vec<StoredRecord>) -> Option<Affected> {
    if schema.unique_key {
        rows.into_iter().next().map(Affected::One)
    } else {
        Some(Affected::Many(rows))
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Dispatches on the requested end state.
///
/// A `Present` request with no attributes on a non-insertable family (a global
/// variable named without a value) is a read-only [`lookup`].
pub async fn reconcile(
    channel: &dyn AdminChannel,
    desired: &RecordDescriptor,
    state: DesiredState,
    options: &ReconcileOptions,
) -> Result<ReconcileOutcome, ReconcileError> {
    match state {
        DesiredState::Present if !desired.has_attributes() && !desired.schema().insertable => {
            lookup(channel, desired).await
        }
        DesiredState::Present => ensure_present(channel, desired, options).await,
        DesiredState::Absent => ensure_absent(channel, desired, options).await,
    }
}

/// Fetches the row carrying the key and echoes it. Never mutates.
pub async fn lookup(
    channel: &dyn AdminChannel,
    desired: &RecordDescriptor,
) -> Result<ReconcileOutcome, ReconcileError> {
    let schema = desired.schema();
    let row = RecordRepository::new(channel)
        .fetch(desired)
        .await?
        .ok_or_else(|| not_found(desired))?;

    Ok(ReconcileOutcome {
        family: schema.name,
        action: Action::Noop,
        changed: false,
        dry_run: false,
        msg: format!("Returned the {} and its current value", schema.noun),
        affected: Some(Affected::One(row)),
        propagated: Vec::new(),
        rows_affected: 0,
    })
}

pub async fn ensure_present(
    channel: &dyn AdminChannel,
    desired: &RecordDescriptor,
    options: &ReconcileOptions,
) -> Result<ReconcileOutcome, ReconcileError> {
    let schema = desired.schema();
    let repo = RecordRepository::new(channel);

    let exists = repo.exists(desired).await?;
    let matched = match (exists, desired.has_attributes()) {
        (false, _) => 0,
        // Full predicate == key predicate; skip the second round-trip.
        (true, false) if schema.unique_key => 1,
        (true, _) => repo.count_desired(desired).await?,
    };
    let state = classify(exists, matched);
    let action = plan_present(schema, state, desired)?;

    info!(
        table = schema.table,
        action = action.as_str(),
        matched,
        dry_run = options.dry_run,
        "ensure_present decided"
    );

    let mut outcome = ReconcileOutcome {
        family: schema.name,
        action,
        changed: action.is_mutation(),
        dry_run: options.dry_run,
        msg: message(schema, DesiredState::Present, action, options.dry_run),
        affected: None,
        propagated: Vec::new(),
        rows_affected: 0,
    };

    if action == Action::Noop {
        let rows = if schema.unique_key {
            repo.fetch(desired).await?.into_iter().collect()
        } else {
            repo.fetch_desired(desired).await?
        };
        outcome.affected = echo(schema, rows);
        return Ok(outcome);
    }
    if options.dry_run {
        return Ok(outcome);
    }

    // Noop returned above and Delete is never planned here.
    let post = match action {
        Action::Update => repo.update(desired).await?,
        _ => repo.insert(desired).await?,
    };
    outcome.rows_affected = 1;
    outcome.affected = if schema.unique_key {
        Some(Affected::One(post))
    } else {
        echo(schema, repo.fetch_desired(desired).await?)
    };
    outcome.propagated = propagate(channel, desired.config_settings(), &options.propagation).await?;
    Ok(outcome)
}

pub async fn ensure_absent(
    channel: &dyn AdminChannel,
    desired: &RecordDescriptor,
    options: &ReconcileOptions,
) -> Result<ReconcileOutcome, ReconcileError> {
    let schema = desired.schema();
    let repo = RecordRepository::new(channel);

    let MatchResult {
        count: matched,
        rows: pre,
    } = repo.match_desired(desired).await?;
    let action = plan_absent(matched, options.force_delete)?;

    info!(
        table = schema.table,
        action = action.as_str(),
        matched,
        dry_run = options.dry_run,
        "ensure_absent decided"
    );

    let mut outcome = ReconcileOutcome {
        family: schema.name,
        action,
        changed: action.is_mutation(),
        dry_run: options.dry_run,
        msg: message(schema, DesiredState::Absent, action, options.dry_run),
        affected: None,
        propagated: Vec::new(),
        rows_affected: 0,
    };

    if action == Action::Noop || options.dry_run {
        return Ok(outcome);
    }

    outcome.rows_affected = repo.delete(desired).await?;
    outcome.affected = if matched > 1 {
        Some(Affected::Many(pre))
    } else {
        echo(schema, pre)
    };
    outcome.propagated = propagate(channel, desired.config_settings(), &options.propagation).await?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pxr_schemas::{GLOBAL_VARIABLES, MYSQL_USERS, SCHEDULER};

    fn variable(name: &str) -> RecordDescriptor {
        RecordDescriptor::builder(&GLOBAL_VARIABLES)
            .field("variable_name", name)
            .build()
            .unwrap()
    }

    #[test]
    fn classify_covers_every_state() {
        assert_eq!(classify(false, 0), RecordState::Absent);
        assert_eq!(classify(true, 0), RecordState::PresentDivergent);
        assert_eq!(classify(true, 1), RecordState::PresentMatching);
        assert_eq!(
            classify(true, 4),
            RecordState::PresentAmbiguous { matched: 4 }
        );
    }

    #[test]
    fn divergent_unique_family_updates_non_unique_creates() {
        let d = variable("mysql-threads");
        assert_eq!(
            plan_present(&MYSQL_USERS, RecordState::PresentDivergent, &d).unwrap(),
            Action::Update
        );
        assert_eq!(
            plan_present(&SCHEDULER, RecordState::PresentDivergent, &d).unwrap(),
            Action::Create
        );
    }

    #[test]
    fn missing_variable_is_not_found_rather_than_created() {
        let d = variable("mysql-nonexistent");
        let err = plan_present(&GLOBAL_VARIABLES, RecordState::Absent, &d).unwrap_err();
        assert_eq!(
            err,
            ReconcileError::NotFound {
                message: "The variable \"mysql-nonexistent\" was not found".to_string()
            }
        );
    }

    #[test]
    fn absent_plan_guards_cardinality() {
        assert_eq!(plan_absent(0, false).unwrap(), Action::Noop);
        assert_eq!(plan_absent(1, false).unwrap(), Action::Delete);
        assert_eq!(plan_absent(2, true).unwrap(), Action::Delete);
        let err = plan_absent(2, false).unwrap_err();
        assert!(matches!(err, ReconcileError::Cardinality { matched: 2, .. }));
    }

    #[test]
    fn messages_follow_noun_and_table() {
        assert_eq!(
            message(&MYSQL_USERS, DesiredState::Present, Action::Create, false),
            "Added user to mysql_users"
        );
        assert_eq!(
            message(&MYSQL_USERS, DesiredState::Present, Action::Create, true),
            "User would have been added to mysql_users, however dry run is enabled."
        );
        assert_eq!(
            message(&MYSQL_USERS, DesiredState::Present, Action::Update, false),
            "Updated user in mysql_users"
        );
        assert_eq!(
            message(&SCHEDULER, DesiredState::Absent, Action::Delete, false),
            "Deleted schedule from scheduler"
        );
        assert_eq!(
            message(&MYSQL_USERS, DesiredState::Present, Action::Noop, false),
            "The user already exists in mysql_users and doesn't need to be updated."
        );
        assert_eq!(
            message(&SCHEDULER, DesiredState::Absent, Action::Noop, false),
            "The schedule is already absent from the scheduler memory configuration"
        );
    }
}
