//! Export node configuration to the snapshot file activity

use crate::activity_names::activities;
use crate::activity_types::{BackupConfigInput, BackupConfigOutput};
use crate::context::RecoveryContext;
use crate::controller_api::endpoints;
use crate::error::RecoveryError;
use crate::snapshot::SnapshotStore;

/// Activity name for logging
pub const NAME: &str = activities::BACKUP_CONFIG;

/// Replace the snapshot with the replica's exported configuration.
///
/// A failed export leaves no snapshot behind; the caller's validation gate
/// turns that into `BackupInvalid`. Only local file errors are raised here.
pub async fn activity(
    ctx: &RecoveryContext,
    input: BackupConfigInput,
) -> Result<BackupConfigOutput, RecoveryError> {
    ctx.trace_info(format!("Backing up node configuration from {}", input.address));

    let store = SnapshotStore::new(&input.snapshot_path);
    store
        .clear()
        .map_err(|e| RecoveryError::snapshot(&input.snapshot_path, e))?;

    let response = match ctx.api().get(&input.address, endpoints::NODE_CONFIG).await {
        Ok(response) => response,
        Err(e) => {
            ctx.trace_error(format!("Configuration export failed: {}", e));
            return Ok(BackupConfigOutput {
                status: None,
                bytes_written: 0,
            });
        }
    };

    if !response.is_success() {
        ctx.trace_error(format!(
            "Configuration export returned {}, not writing snapshot",
            response.status
        ));
        return Ok(BackupConfigOutput {
            status: Some(response.status),
            bytes_written: 0,
        });
    }

    store
        .replace(&response.body)
        .map_err(|e| RecoveryError::snapshot(&input.snapshot_path, e))?;

    ctx.trace_info(format!(
        "Wrote {} bytes to {}",
        response.body.len(),
        input.snapshot_path.display()
    ));

    Ok(BackupConfigOutput {
        status: Some(response.status),
        bytes_written: response.body.len() as u64,
    })
}
