//! Command handler modules for the `pxr` binary.
//!
//! Shared setup (config, login, connection) lives here. Each command path
//! validates its own input first so a bad request never opens a connection.

pub mod record;
pub mod transfer;

use anyhow::Result;
use pxr_config::{
    load_layered_yaml, report_unused_keys, resolve_admin_target, AdminOverrides, LoadedConfig,
    UnusedKeyPolicy,
};
use pxr_db::AdminConnection;
use pxr_reconcile::{ReconcileError, StoreStage};
use serde_json::{json, Value};
use tracing::warn;

use crate::LoginArgs;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Load `--config` layers (none is an empty config) and warn about keys
/// nothing reads.
pub fn load_config(paths: &[String]) -> Result<LoadedConfig> {
    let loaded = if paths.is_empty() {
        LoadedConfig::empty()?
    } else {
        let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
        load_layered_yaml(&path_refs)?
    };

    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    for leaf in &report.unused_leaf_pointers {
        warn!(leaf = %leaf, "config key is not used");
    }
    Ok(loaded)
}

/// Resolve the login and open the admin session.
///
/// Target resolution errors (bad port, unreadable credential file) come back
/// as-is; a failed connection is `STORE_ERROR stage=connect`.
pub async fn connect_admin(login: &LoginArgs, config: &LoadedConfig) -> Result<AdminConnection> {
    let overrides = AdminOverrides {
        host: login.login_host.clone(),
        port: login.login_port,
        user: login.login_user.clone(),
        unix_socket: login.login_unix_socket.clone(),
        credentials_file: login.credentials_file.clone(),
    };
    let target = resolve_admin_target(&config.config_json, &overrides, |name| {
        std::env::var(name).ok()
    })?;

    match pxr_db::connect(&target).await {
        Ok(conn) => Ok(conn),
        Err(e) => Err(ReconcileError::Store {
            stage: StoreStage::Connect,
            message: format!("{e:#}"),
        }
        .into()),
    }
}

/// `pxr config-hash`: hash, canonical form and unused keys of the merged layers.
pub fn config_hash(paths: &[String]) -> Result<Value> {
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    let loaded = load_layered_yaml(&path_refs)?;
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    Ok(json!({
        "config_hash": loaded.config_hash,
        "config": loaded.config_json,
        "unused_keys": report.unused_leaf_pointers,
    }))
}
