//! Input types for recovery orchestrations

use serde::{Deserialize, Serialize};
use sona_recovery_models::ArpMode;
use std::path::PathBuf;

// ============================================================================
// Recover Cluster Orchestration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecoverClusterInput {
    /// Kubernetes namespace holding the controller pods
    pub namespace: String,
    /// Cluster manager pod name
    pub cluster_manager: String,
    /// Controller replica pod names; the first one is the control point
    pub replicas: Vec<String>,
    /// ARP mode applied after restore
    #[serde(default)]
    pub arp_mode: ArpMode,
    /// Snapshot file location
    pub snapshot_path: PathBuf,
    /// Interval between polls
    pub poll_interval_ms: u64,
    /// Bound on each pod wait (None = wait forever)
    pub pod_timeout_seconds: Option<u64>,
    /// Bound on each activation wait (None = wait forever)
    pub app_timeout_seconds: Option<u64>,
    /// Also wait for the cluster manager pod to come back before the replicas
    #[serde(default)]
    pub wait_for_cluster_manager: bool,
    /// Wait on all replicas concurrently instead of one at a time
    #[serde(default)]
    pub parallel_waits: bool,
}
