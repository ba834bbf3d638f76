//! Resolve a pod's current address activity

use crate::activity_names::activities;
use crate::activity_types::{ResolveAddressInput, ResolveAddressOutput};
use crate::context::RecoveryContext;
use crate::error::RecoveryError;
use crate::k8s_client::find_exact;

/// Activity name for logging
pub const NAME: &str = activities::RESOLVE_ADDRESS;

pub async fn activity(
    ctx: &RecoveryContext,
    input: ResolveAddressInput,
) -> Result<ResolveAddressOutput, RecoveryError> {
    let pods = ctx.platform().list_pods(&input.namespace).await?;

    let address = find_exact(&pods, &input.pod_name)
        .and_then(|pod| pod.address())
        .map(str::to_string)
        .ok_or_else(|| RecoveryError::AddressUnavailable {
            pod: input.pod_name.clone(),
        })?;

    ctx.trace_info(format!("Resolved {} to {}", input.pod_name, address));

    Ok(ResolveAddressOutput {
        pod_name: input.pod_name,
        address,
    })
}
