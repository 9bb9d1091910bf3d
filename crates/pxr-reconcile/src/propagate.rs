//! Layer propagation after a successful mutation.
//!
//! Order is fixed: `SAVE <family> TO DISK` then `LOAD <family> TO RUNTIME`.
//! Runtime load reads from the staging layer, not from disk, so the two
//! toggles are independent.

use pxr_schemas::ConfigSettings;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{AdminChannel, ReconcileError, Statement, StoreStage};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Propagation {
    pub save_to_disk: bool,
    pub load_to_runtime: bool,
}

impl Default for Propagation {
    fn default() -> Self {
        Self {
            save_to_disk: true,
            load_to_runtime: true,
        }
    }
}

impl Propagation {
    pub fn none() -> Self {
        Self {
            save_to_disk: false,
            load_to_runtime: false,
        }
    }
}

pub fn propagation_commands(settings: ConfigSettings, propagation: &Propagation) -> Vec<String> {
    let mut out = Vec::with_capacity(2);
    if propagation.save_to_disk {
        out.push(format!("SAVE {} TO DISK", settings.as_str()));
    }
    if propagation.load_to_runtime {
        out.push(format!("LOAD {} TO RUNTIME", settings.as_str()));
    }
    out
}

/// Issues the propagation commands one at a time and returns the ones sent.
///
/// A failed step aborts the rest. The mutation that preceded it is not rolled
/// back; the caller sees `STORE_ERROR stage=propagate` and may retry.
pub async fn propagate(
    channel: &dyn AdminChannel,
    settings: ConfigSettings,
    propagation: &Propagation,
) -> Result<Vec<String>, ReconcileError> {
    let mut issued = Vec::new();
    for command in propagation_commands(settings, propagation) {
        let stmt = Statement::Admin {
            command: command.clone(),
        };
        if let Err(e) = channel.execute(&stmt).await {
            warn!(command = %command, error = %e, "propagation step failed");
            let done = if issued.is_empty() {
                "none".to_string()
            } else {
                issued.join(", ")
            };
            return Err(ReconcileError::Store {
                stage: StoreStage::Propagate,
                message: format!(
                    "{command} failed (already issued: {done}): {}",
                    e.diagnostic()
                ),
            });
        }
        info!(command = %command, "propagated");
        issued.push(command);
    }
    Ok(issued)
}
