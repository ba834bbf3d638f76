//! Per-run context handed to every activity and orchestration

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::controller_api::ControllerApi;
use crate::error::RecoveryError;
use crate::k8s_client::PodPlatform;

/// Collaborators and identity of one recovery run
#[derive(Clone)]
pub struct RecoveryContext {
    run_id: Uuid,
    platform: Arc<dyn PodPlatform>,
    api: Arc<dyn ControllerApi>,
    cancel: CancellationToken,
}

impl RecoveryContext {
    pub fn new(platform: Arc<dyn PodPlatform>, api: Arc<dyn ControllerApi>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            platform,
            api,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned token, e.g. one tripped by a signal handler
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn platform(&self) -> &dyn PodPlatform {
        self.platform.as_ref()
    }

    pub fn api(&self) -> &dyn ControllerApi {
        self.api.as_ref()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Step boundary: stop here if the run was cancelled
    pub fn checkpoint(&self) -> Result<(), RecoveryError> {
        if self.cancel.is_cancelled() {
            self.trace_warn("Cancellation requested, stopping before next step");
            return Err(RecoveryError::Cancelled);
        }
        Ok(())
    }

    pub fn trace_info(&self, message: impl AsRef<str>) {
        tracing::info!(run_id = %self.run_id, "{}", message.as_ref());
    }

    pub fn trace_warn(&self, message: impl AsRef<str>) {
        tracing::warn!(run_id = %self.run_id, "{}", message.as_ref());
    }

    pub fn trace_error(&self, message: impl AsRef<str>) {
        tracing::error!(run_id = %self.run_id, "{}", message.as_ref());
    }
}
