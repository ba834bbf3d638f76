//! Reinstall flow rules activity

use sona_recovery_models::ReconfigureOutcome;

use crate::activities::record_outcome;
use crate::activity_names::activities;
use crate::activity_types::SyncInput;
use crate::context::RecoveryContext;
use crate::controller_api::endpoints;

/// Activity name for logging
pub const NAME: &str = activities::SYNC_RULES;

pub async fn activity(ctx: &RecoveryContext, input: SyncInput) -> ReconfigureOutcome {
    ctx.trace_info(format!("Synchronizing flow rules on {}", input.address));

    let result = ctx.api().get(&input.address, endpoints::SYNC_RULES).await;

    record_outcome(ctx, NAME, &input.address, result)
}
