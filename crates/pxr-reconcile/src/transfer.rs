//! Bulk layer-to-layer transfers of whole config families.
//!
//! Legality is one table lookup. `CONFIG` is source-only, so the only tuple
//! naming it is `LOAD ... FROM CONFIG`.

use pxr_schemas::{ConfigSettings, Direction, PersistenceLayer, TransferAction};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AdminChannel, ReconcileError, Statement, StoreStage, TransferOutcome};

use PersistenceLayer::{Config, Disk, Memory, Runtime};
use TransferAction::{Load, Save};

pub const LEGAL_TRANSFERS: [(TransferAction, Direction, PersistenceLayer); 13] = [
    (Load, Direction::From, Memory),
    (Load, Direction::From, Disk),
    (Load, Direction::From, Runtime),
    (Load, Direction::From, Config),
    (Load, Direction::To, Memory),
    (Load, Direction::To, Disk),
    (Load, Direction::To, Runtime),
    (Save, Direction::From, Memory),
    (Save, Direction::From, Disk),
    (Save, Direction::From, Runtime),
    (Save, Direction::To, Memory),
    (Save, Direction::To, Disk),
    (Save, Direction::To, Runtime),
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub action: TransferAction,
    pub direction: Direction,
    pub layer: PersistenceLayer,
    /// One bulk command is issued per entry, in order.
    pub settings: Vec<ConfigSettings>,
}

impl TransferRequest {
    pub fn commands(&self) -> Vec<String> {
        self.settings
            .iter()
            .map(|s| transfer_command(self.action, *s, self.direction, self.layer))
            .collect()
    }
}

pub fn transfer_command(
    action: TransferAction,
    settings: ConfigSettings,
    direction: Direction,
    layer: PersistenceLayer,
) -> String {
    format!(
        "{} {} {} {}",
        action.as_str(),
        settings.as_str(),
        direction.as_str(),
        layer.as_str()
    )
}

pub fn validate_transfer(
    action: TransferAction,
    direction: Direction,
    layer: PersistenceLayer,
) -> Result<(), ReconcileError> {
    if LEGAL_TRANSFERS.contains(&(action, direction, layer)) {
        return Ok(());
    }

    let bad_action = action != Load;
    let bad_direction = direction != Direction::From;
    let message = match (layer, bad_action, bad_direction) {
        (Config, true, true) => format!(
            "Neither the action \"{action}\" nor the direction \"{direction}\" are a valid \
             combination with the CONFIG layer"
        ),
        (Config, true, false) => {
            format!("The action \"{action}\" is not a valid combination with the CONFIG layer")
        }
        (Config, false, _) => format!(
            "The direction \"{direction}\" is not a valid combination with the CONFIG layer"
        ),
        _ => format!("\"{action} {direction} {layer}\" is not a legal transfer"),
    };
    Err(ReconcileError::validation(message))
}

/// Validates the request and lists its commands without a channel.
pub fn simulate_transfer(request: &TransferRequest) -> Result<TransferOutcome, ReconcileError> {
    validate_transfer(request.action, request.direction, request.layer)?;
    if request.settings.is_empty() {
        return Err(ReconcileError::validation(
            "at least one config family is required for a transfer",
        ));
    }

    Ok(TransferOutcome {
        changed: true,
        dry_run: true,
        msg: "Config would have been transferred, however dry run is enabled.".to_string(),
        commands: request.commands(),
    })
}

/// Validates, then issues one bulk command per family.
///
/// `changed` is always `true` on success. Dry run is [`simulate_transfer`]:
/// the channel is never touched.
pub async fn transfer(
    channel: &dyn AdminChannel,
    request: &TransferRequest,
    dry_run: bool,
) -> Result<TransferOutcome, ReconcileError> {
    let simulated = simulate_transfer(request)?;
    if dry_run {
        return Ok(simulated);
    }

    let commands = simulated.commands;
    for command in &commands {
        let stmt = Statement::Admin {
            command: command.clone(),
        };
        channel
            .execute(&stmt)
            .await
            .map_err(|e| ReconcileError::store(StoreStage::Write, &e))?;
        info!(command = %command, "transfer issued");
    }

    Ok(TransferOutcome {
        changed: true,
        dry_run: false,
        msg: format!("Issued {} config transfer command(s)", commands.len()),
        commands,
    })
}
