//! Set ARP mode activity

use sona_recovery_models::ReconfigureOutcome;

use crate::activities::record_outcome;
use crate::activity_names::activities;
use crate::activity_types::SetArpModeInput;
use crate::context::RecoveryContext;
use crate::controller_api::endpoints;

/// Activity name for logging
pub const NAME: &str = activities::SET_ARP_MODE;

pub async fn activity(ctx: &RecoveryContext, input: SetArpModeInput) -> ReconfigureOutcome {
    ctx.trace_info(format!("Setting ARP mode to {} on {}", input.mode, input.address));

    let result = ctx
        .api()
        .get(&input.address, &endpoints::arp_mode(input.mode))
        .await;

    record_outcome(ctx, NAME, &input.address, result)
}
