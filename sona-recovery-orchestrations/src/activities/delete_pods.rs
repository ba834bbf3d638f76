//! Delete controller cluster pods activity

use crate::activity_names::activities;
use crate::activity_types::{DeletePodsInput, DeletePodsOutput};
use crate::context::RecoveryContext;
use crate::error::RecoveryError;
use crate::k8s_client::DeleteOutcome;

/// Activity name for logging
pub const NAME: &str = activities::DELETE_PODS;

/// Request deletion of every pod, in the given order.
///
/// Deletion is fire-and-forget: the platform recreates the pods under the
/// same names on its own.
pub async fn activity(
    ctx: &RecoveryContext,
    input: DeletePodsInput,
) -> Result<DeletePodsOutput, RecoveryError> {
    let mut output = DeletePodsOutput {
        deleted: Vec::new(),
        already_absent: Vec::new(),
    };

    for pod_name in input.pod_names {
        ctx.trace_info(format!("Deleting pod {}", pod_name));

        match ctx.platform().delete_pod(&input.namespace, &pod_name).await? {
            DeleteOutcome::Deleted => output.deleted.push(pod_name),
            DeleteOutcome::AlreadyAbsent => {
                ctx.trace_info(format!("Pod {} not found, skipping", pod_name));
                output.already_absent.push(pod_name);
            }
        }
    }

    Ok(output)
}
