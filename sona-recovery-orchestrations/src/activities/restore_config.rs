//! Restore node configuration from the snapshot activity

use sona_recovery_models::ReconfigureOutcome;

use crate::activities::record_outcome;
use crate::activity_names::activities;
use crate::activity_types::RestoreConfigInput;
use crate::context::RecoveryContext;
use crate::controller_api::endpoints;
use crate::error::RecoveryError;
use crate::snapshot::SnapshotStore;

/// Activity name for logging
pub const NAME: &str = activities::RESTORE_CONFIG;

/// POST the snapshot bytes back to the replica.
///
/// The snapshot must still be readable; the call itself is fire-and-forget.
pub async fn activity(
    ctx: &RecoveryContext,
    input: RestoreConfigInput,
) -> Result<ReconfigureOutcome, RecoveryError> {
    let snapshot = SnapshotStore::new(&input.snapshot_path)
        .read()
        .map_err(|e| RecoveryError::snapshot(&input.snapshot_path, e))?;

    ctx.trace_info(format!(
        "Restoring {} bytes of node configuration to {}",
        snapshot.bytes.len(),
        input.address
    ));

    let result = ctx
        .api()
        .post_json(&input.address, endpoints::NODE_CONFIG, snapshot.bytes)
        .await;

    Ok(record_outcome(ctx, NAME, &input.address, result))
}
