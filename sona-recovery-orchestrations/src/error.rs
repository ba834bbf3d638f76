//! Error taxonomy for recovery runs

use std::path::PathBuf;
use std::time::Duration;

use sona_recovery_models::TopologyError;

use crate::k8s_client::PlatformError;

#[derive(Debug, thiserror::Error)]
pub enum RecoveryError {
    #[error("no address available for pod '{pod}'")]
    AddressUnavailable { pod: String },

    /// The fail-fast gate: nothing destructive has happened yet.
    #[error("configuration backup at {} is missing or empty", .path.display())]
    BackupInvalid { path: PathBuf },

    #[error("pod '{pod}' not running after {waited:?} (last observed: {last_observed})")]
    PodStuck {
        pod: String,
        last_observed: String,
        waited: Duration,
    },

    #[error("controller at {address} not activated after {waited:?} (last observed: {last_observed})")]
    NotActivated {
        address: String,
        last_observed: String,
        waited: Duration,
    },

    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("snapshot I/O error at {}: {source}", .path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid topology: {0}")]
    Topology(#[from] TopologyError),

    #[error("recovery cancelled")]
    Cancelled,
}

impl RecoveryError {
    pub fn snapshot(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Snapshot {
            path: path.into(),
            source,
        }
    }

    /// True when the run stopped at the backup gate, before any pod was touched
    pub fn is_backup_invalid(&self) -> bool {
        matches!(self, Self::BackupInvalid { .. })
    }
}
