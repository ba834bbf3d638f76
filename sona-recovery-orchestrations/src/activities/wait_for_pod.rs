//! Wait for a recreated pod to be listed and Running activity

use sona_recovery_models::PodStatus;
use tokio::time::Instant;

use crate::activity_names::activities;
use crate::activity_types::{WaitForPodInput, WaitForPodOutput};
use crate::context::RecoveryContext;
use crate::error::RecoveryError;
use crate::k8s_client::{find_exact, PlatformError, PodEntry};
use crate::poll::{poll_until, PollFailure, PollPolicy, Readiness};

/// Activity name for logging
pub const NAME: &str = activities::WAIT_FOR_POD;

/// Two-phase wait: first until a listing entry's name equals the pod name
/// exactly and the entry is not the terminating old pod, then until that
/// pod's phase is exactly `Running`.
///
/// Both phases share the input's deadline; listing errors count as "not yet".
pub async fn activity(
    ctx: &RecoveryContext,
    input: WaitForPodInput,
) -> Result<WaitForPodOutput, RecoveryError> {
    let policy = PollPolicy::from_input(input.poll_interval_ms, input.timeout_seconds);
    let platform = ctx.platform();
    let namespace = input.namespace.as_str();
    let pod_name = input.pod_name.as_str();
    let started = Instant::now();

    ctx.trace_info(format!("Waiting for pod {} to be recreated", pod_name));

    let existence = poll_until(
        &format!("pod {} to be listed", pod_name),
        &policy,
        ctx.cancellation(),
        move || async move {
            let pods = platform.list_pods(namespace).await?;
            Ok::<_, PlatformError>(match find_exact(&pods, pod_name) {
                // The old pod, still listed during its grace period
                Some(pod) if pod.terminating => Readiness::Pending(pod.status().to_string()),
                Some(_) => Readiness::Ready(()),
                None => Readiness::Pending(PodStatus::Absent.to_string()),
            })
        },
    )
    .await
    .map_err(|failure| stuck(pod_name, started, failure))?;

    ctx.trace_info(format!(
        "Pod {} listed after {} poll(s), waiting for Running",
        pod_name, existence.attempts
    ));

    let remaining = policy.with_deadline(
        policy
            .deadline
            .map(|deadline| deadline.saturating_sub(started.elapsed())),
    );

    let running = poll_until(
        &format!("pod {} to be Running", pod_name),
        &remaining,
        ctx.cancellation(),
        move || async move {
            let pods = platform.list_pods(namespace).await?;
            let status = find_exact(&pods, pod_name)
                .map(PodEntry::status)
                .unwrap_or(PodStatus::Absent);
            Ok::<_, PlatformError>(if status.is_running() {
                Readiness::Ready(status)
            } else {
                Readiness::Pending(status.to_string())
            })
        },
    )
    .await
    .map_err(|failure| stuck(pod_name, started, failure))?;

    ctx.trace_info(format!(
        "Pod {} is {} after {} poll(s)",
        pod_name, running.value, running.attempts
    ));

    Ok(WaitForPodOutput {
        pod_phase: running.value.to_string(),
        existence_attempts: existence.attempts,
        running_attempts: running.attempts,
    })
}

fn stuck(pod_name: &str, started: Instant, failure: PollFailure) -> RecoveryError {
    match failure {
        PollFailure::Cancelled => RecoveryError::Cancelled,
        PollFailure::TimedOut { last_observed, .. } => RecoveryError::PodStuck {
            pod: pod_name.to_string(),
            last_observed,
            waited: started.elapsed(),
        },
    }
}
