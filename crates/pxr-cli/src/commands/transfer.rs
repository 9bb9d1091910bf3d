use anyhow::Result;
use pxr_reconcile::{simulate_transfer, transfer, TransferRequest};
use serde_json::Value;

use crate::{LoginArgs, TransferArgs};

/// `pxr transfer`. Legality is checked before any connection is made, and a
/// dry run never connects.
pub async fn run(login: &LoginArgs, args: &TransferArgs) -> Result<Value> {
    let request = TransferRequest {
        action: args.action,
        direction: args.direction,
        layer: args.layer,
        settings: args.families.clone(),
    };
    let simulated = simulate_transfer(&request)?;
    if args.dry_run {
        return Ok(serde_json::to_value(&simulated)?);
    }

    let config = super::load_config(&login.config_paths)?;
    let conn = super::connect_admin(login, &config).await?;
    let result = transfer(&conn, &request, false).await;
    conn.close().await;

    Ok(serde_json::to_value(&result?)?)
}
