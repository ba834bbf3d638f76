//! Wait for a replica's applications to activate activity

use tokio::time::Instant;

use crate::activity_names::activities;
use crate::activity_types::{WaitForAppInput, WaitForAppOutput};
use crate::context::RecoveryContext;
use crate::controller_api::{endpoints, ApiError, ControllerApi};
use crate::error::RecoveryError;
use crate::poll::{poll_until, PollFailure, PollPolicy, Readiness};

/// Activity name for logging
pub const NAME: &str = activities::WAIT_FOR_APP;

/// One activation probe: 200 means activated; any other status or a
/// transport failure means "not yet", never an error.
pub async fn is_activated(api: &dyn ControllerApi, address: &str) -> bool {
    matches!(probe(api, address).await, Ok(Readiness::Ready(())))
}

async fn probe(api: &dyn ControllerApi, address: &str) -> Result<Readiness<()>, ApiError> {
    let response = api.get(address, endpoints::FLOATING_IPS).await?;
    Ok(if response.status == 200 {
        Readiness::Ready(())
    } else {
        Readiness::Pending(format!("HTTP {}", response.status))
    })
}

pub async fn activity(
    ctx: &RecoveryContext,
    input: WaitForAppInput,
) -> Result<WaitForAppOutput, RecoveryError> {
    let policy = PollPolicy::from_input(input.poll_interval_ms, input.timeout_seconds);
    let api = ctx.api();
    let address = input.address.as_str();
    let started = Instant::now();

    ctx.trace_info(format!("Waiting for applications on {} to activate", address));

    let polled = poll_until(
        &format!("applications on {} to activate", address),
        &policy,
        ctx.cancellation(),
        move || probe(api, address),
    )
    .await
    .map_err(|failure| match failure {
        PollFailure::Cancelled => RecoveryError::Cancelled,
        PollFailure::TimedOut { last_observed, .. } => RecoveryError::NotActivated {
            address: address.to_string(),
            last_observed,
            waited: started.elapsed(),
        },
    })?;

    ctx.trace_info(format!(
        "Applications on {} activated after {} probe(s)",
        address, polled.attempts
    ));

    Ok(WaitForAppOutput {
        address: input.address.clone(),
        attempts: polled.attempts,
    })
}
