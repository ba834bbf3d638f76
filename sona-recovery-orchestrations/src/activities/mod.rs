pub mod resolve_address;
pub mod backup_config;
pub mod delete_pods;
pub mod wait_for_pod;
pub mod wait_for_app;
pub mod restore_config;
pub mod set_arp_mode;
pub mod sync_states;
pub mod sync_rules;

use sona_recovery_models::ReconfigureOutcome;

use crate::activity_names::short_name;
use crate::context::RecoveryContext;
use crate::controller_api::{ApiError, ApiResponse};

/// Turn a fire-and-forget call result into a logged, reportable outcome
pub(crate) fn record_outcome(
    ctx: &RecoveryContext,
    name: &str,
    address: &str,
    result: Result<ApiResponse, ApiError>,
) -> ReconfigureOutcome {
    let step = short_name(name).to_string();

    match result {
        Ok(response) => {
            if response.is_success() {
                ctx.trace_info(format!("{} on {} returned {}", step, address, response.status));
            } else {
                ctx.trace_warn(format!(
                    "{} on {} returned {}, continuing",
                    step, address, response.status
                ));
            }
            ReconfigureOutcome {
                step,
                address: address.to_string(),
                status: Some(response.status),
                error: None,
            }
        }
        Err(e) => {
            ctx.trace_warn(format!("{} on {} failed: {}, continuing", step, address, e));
            ReconfigureOutcome {
                step,
                address: address.to_string(),
                status: None,
                error: Some(e.to_string()),
            }
        }
    }
}
