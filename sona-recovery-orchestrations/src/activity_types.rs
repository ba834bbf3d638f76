//! Input and output types for recovery activities

use serde::{Deserialize, Serialize};
use sona_recovery_models::ArpMode;
use std::path::PathBuf;

// ============================================================================
// Resolve Address Activity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolveAddressInput {
    /// Kubernetes namespace
    pub namespace: String,
    /// Stable pod name
    pub pod_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolveAddressOutput {
    pub pod_name: String,
    /// Current pod IP
    pub address: String,
}

// ============================================================================
// Backup Config Activity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackupConfigInput {
    /// Replica to export from
    pub address: String,
    /// Where the snapshot is written
    pub snapshot_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackupConfigOutput {
    /// HTTP status of the export call (None on transport failure)
    pub status: Option<u16>,
    /// Bytes written to the snapshot file
    pub bytes_written: u64,
}

// ============================================================================
// Delete Pods Activity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeletePodsInput {
    /// Kubernetes namespace
    pub namespace: String,
    /// Pods to delete, in order
    pub pod_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeletePodsOutput {
    /// Pods a delete request was accepted for
    pub deleted: Vec<String>,
    /// Pods that were already gone
    pub already_absent: Vec<String>,
}

// ============================================================================
// Wait For Pod Activity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaitForPodInput {
    /// Kubernetes namespace
    pub namespace: String,
    /// Stable pod name (matched exactly)
    pub pod_name: String,
    /// Interval between polls
    pub poll_interval_ms: u64,
    /// Give up after this long (None = wait forever)
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaitForPodOutput {
    /// Final pod phase (always "Running")
    pub pod_phase: String,
    /// Polls spent waiting for the pod to be listed
    pub existence_attempts: u32,
    /// Polls spent waiting for Running
    pub running_attempts: u32,
}

// ============================================================================
// Wait For App Activity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaitForAppInput {
    /// Replica address
    pub address: String,
    /// Interval between probes
    pub poll_interval_ms: u64,
    /// Give up after this long (None = wait forever)
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaitForAppOutput {
    pub address: String,
    /// Probes sent until activation
    pub attempts: u32,
}

// ============================================================================
// Reconfiguration Activities
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestoreConfigInput {
    /// Replica receiving the configuration
    pub address: String,
    /// Snapshot to restore
    pub snapshot_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetArpModeInput {
    pub address: String,
    pub mode: ArpMode,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncInput {
    pub address: String,
}
