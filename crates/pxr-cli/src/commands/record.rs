//! `pxr variable|user|server|schedule`: build the desired record, then
//! reconcile it.

use anyhow::Result;
use pxr_config::propagation_defaults;
use pxr_reconcile::{reconcile, DesiredState, ReconcileError, ReconcileOptions};
use pxr_schemas::{
    DescriptorBuilder, FieldValue, RecordDescriptor, GLOBAL_VARIABLES, MYSQL_SERVERS, MYSQL_USERS,
    SCHEDULER,
};
use serde_json::Value;
use tracing::info;

use crate::{LoginArgs, PropagationArgs, ScheduleArgs, ServerArgs, StateArgs, UserArgs, VariableArgs};

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

fn finish(mut builder: DescriptorBuilder, state: Option<&StateArgs>) -> Result<RecordDescriptor> {
    if let Some(state) = state {
        // Applied last: an explicit NULL wins over a value for the same field.
        for field in &state.clear {
            builder = builder.field(field.as_str(), FieldValue::Null);
        }
    }
    builder.build().map_err(|e| ReconcileError::from(e).into())
}

pub fn variable_descriptor(args: &VariableArgs) -> Result<RecordDescriptor> {
    let builder = RecordDescriptor::builder(&GLOBAL_VARIABLES)
        .field("variable_name", args.name.as_str())
        .field_opt("variable_value", args.value.as_deref());
    finish(builder, None)
}

pub fn user_descriptor(args: &UserArgs) -> Result<RecordDescriptor> {
    let password = match &args.password_env {
        Some(var) => match std::env::var(var) {
            Ok(v) => Some(v),
            Err(_) => {
                return Err(ReconcileError::validation(format!(
                    "env var '{var}' named by --password-env is not set"
                ))
                .into())
            }
        },
        None => None,
    };

    let builder = RecordDescriptor::builder(&MYSQL_USERS)
        .field("username", args.username.as_str())
        .field_opt("backend", args.backend)
        .field_opt("frontend", args.frontend)
        .field_opt("password", password)
        .field_opt("active", args.active)
        .field_opt("use_ssl", args.use_ssl)
        .field_opt("default_hostgroup", args.default_hostgroup)
        .field_opt("default_schema", args.default_schema.as_deref())
        .field_opt("transaction_persistent", args.transaction_persistent)
        .field_opt("fast_forward", args.fast_forward)
        .field_opt("max_connections", args.max_connections);
    finish(builder, Some(&args.state))
}

pub fn server_descriptor(args: &ServerArgs) -> Result<RecordDescriptor> {
    let builder = RecordDescriptor::builder(&MYSQL_SERVERS)
        .field_opt("hostgroup_id", args.hostgroup_id)
        .field("hostname", args.hostname.as_str())
        .field_opt("port", args.port)
        .field_opt("status", args.status.as_deref())
        .field_opt("weight", args.weight)
        .field_opt("compression", args.compression)
        .field_opt("max_connections", args.max_connections)
        .field_opt("max_replication_lag", args.max_replication_lag)
        .field_opt("use_ssl", args.use_ssl)
        .field_opt("max_latency_ms", args.max_latency_ms)
        .field_opt("comment", args.comment.as_deref());
    finish(builder, Some(&args.state))
}

pub fn schedule_descriptor(args: &ScheduleArgs) -> Result<RecordDescriptor> {
    let builder = RecordDescriptor::builder(&SCHEDULER)
        .field_opt("active", args.active)
        .field_opt("interval_ms", args.interval_ms)
        .field("filename", args.filename.as_str())
        .field_opt("arg1", args.arg1.as_deref())
        .field_opt("arg2", args.arg2.as_deref())
        .field_opt("arg3", args.arg3.as_deref())
        .field_opt("arg4", args.arg4.as_deref())
        .field_opt("arg5", args.arg5.as_deref())
        .field_opt("comment", args.comment.as_deref());
    finish(builder, Some(&args.state))
}

// ---------------------------------------------------------------------------
// Apply
// ---------------------------------------------------------------------------

pub async fn apply(
    login: &LoginArgs,
    flags: &PropagationArgs,
    desired: RecordDescriptor,
    state: DesiredState,
    force_delete: bool,
) -> Result<Value> {
    let config = super::load_config(&login.config_paths)?;

    let mut propagation = propagation_defaults(&config.config_json)?;
    if flags.no_save_to_disk {
        propagation.save_to_disk = false;
    }
    if flags.no_load_to_runtime {
        propagation.load_to_runtime = false;
    }
    let options = ReconcileOptions {
        dry_run: flags.dry_run,
        force_delete,
        propagation,
    };

    let conn = super::connect_admin(login, &config).await?;
    let result = reconcile(&conn, &desired, state, &options).await;
    conn.close().await;
    let outcome = result?;

    info!(
        family = outcome.family,
        action = outcome.action.as_str(),
        changed = outcome.changed,
        config_hash = %config.config_hash,
        "reconcile finished"
    );
    Ok(serde_json::to_value(&outcome)?)
}
