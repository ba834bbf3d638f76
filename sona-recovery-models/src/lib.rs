use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Topology membership of a pod
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    ClusterManager,
    ControllerReplica,
}

/// A pod in the controller cluster, identified by its stable platform name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub role: NodeRole,
    /// Pod IP, resolved lazily. Only controller replicas need one.
    pub address: Option<String>,
}

impl Node {
    pub fn cluster_manager(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: NodeRole::ClusterManager,
            address: None,
        }
    }

    pub fn replica(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: NodeRole::ControllerReplica,
            address: None,
        }
    }

    pub fn is_replica(&self) -> bool {
        self.role == NodeRole::ControllerReplica
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    #[error("topology needs at least one controller replica")]
    NoReplicas,

    #[error("pod names must not be empty")]
    EmptyName,

    #[error("pod name '{0}' appears more than once")]
    DuplicateName(String),
}

/// Fixed cluster topology: exactly one cluster manager followed by the
/// controller replicas in configured order.
///
/// The order is also the teardown order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Topology {
    nodes: Vec<Node>,
}

impl Topology {
    pub fn new<I, S>(cluster_manager: impl Into<String>, replicas: I) -> Result<Self, TopologyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut nodes = vec![Node::cluster_manager(cluster_manager)];
        nodes.extend(replicas.into_iter().map(Node::replica));

        if nodes.len() < 2 {
            return Err(TopologyError::NoReplicas);
        }

        for (i, node) in nodes.iter().enumerate() {
            if node.name.trim().is_empty() {
                return Err(TopologyError::EmptyName);
            }
            if nodes[..i].iter().any(|other| other.name == node.name) {
                return Err(TopologyError::DuplicateName(node.name.clone()));
            }
        }

        Ok(Self { nodes })
    }

    /// All nodes in teardown order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn cluster_manager(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn replicas(&self) -> &[Node] {
        &self.nodes[1..]
    }

    pub fn replicas_mut(&mut self) -> &mut [Node] {
        &mut self.nodes[1..]
    }

    /// The single control point for backup and reconfiguration
    pub fn first_replica(&self) -> &Node {
        &self.nodes[1]
    }
}

/// Pod status as observed by a fresh platform query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PodStatus {
    Absent,
    Pending,
    Running,
    Other(String),
}

impl PodStatus {
    /// Map a Kubernetes pod phase. A listed pod without a phase has not been
    /// scheduled yet and counts as pending.
    pub fn from_phase(phase: Option<&str>) -> Self {
        match phase {
            None | Some("Pending") => Self::Pending,
            Some("Running") => Self::Running,
            Some(other) => Self::Other(other.to_string()),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for PodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("Absent"),
            Self::Pending => f.write_str("Pending"),
            Self::Running => f.write_str("Running"),
            Self::Other(phase) => f.write_str(phase),
        }
    }
}

/// Address-resolution strategy enforced by the controller after recovery
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArpMode {
    #[default]
    Broadcast,
    Proxy,
}

impl ArpMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Broadcast => "broadcast",
            Self::Proxy => "proxy",
        }
    }
}

impl fmt::Display for ArpMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArpMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "broadcast" => Ok(Self::Broadcast),
            "proxy" => Ok(Self::Proxy),
            other => Err(format!("unknown ARP mode '{}' (expected broadcast or proxy)", other)),
        }
    }
}

/// Phases of a recovery run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    BackingUp,
    BackupFailed,
    BackupOk,
    TearingDown,
    WaitingForPods,
    WaitingForApps,
    Restoring,
    Reconfiguring,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::BackingUp => "backing-up",
            Self::BackupFailed => "backup-failed",
            Self::BackupOk => "backup-ok",
            Self::TearingDown => "tearing-down",
            Self::WaitingForPods => "waiting-for-pods",
            Self::WaitingForApps => "waiting-for-apps",
            Self::Restoring => "restoring",
            Self::Reconfiguring => "reconfiguring",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of one post-recovery call against the controller API.
///
/// Reconfiguration is fire-and-forget: a failed outcome is reported, never raised.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconfigureOutcome {
    /// Step name (e.g. "restore-config")
    pub step: String,
    /// Replica address the call was sent to
    pub address: String,
    /// HTTP status, if the call completed
    pub status: Option<u16>,
    /// Transport error, if it did not
    pub error: Option<String>,
}

impl ReconfigureOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && matches!(self.status, Some(code) if (200..300).contains(&code))
    }
}

/// Replica addresses before and after recreation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplicaReport {
    pub name: String,
    pub address_before: String,
    pub address_after: String,
}

/// Summary of a completed recovery run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecoveryReport {
    pub run_id: Uuid,
    pub phase: RunPhase,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Size of the configuration snapshot taken before teardown
    pub snapshot_bytes: u64,
    /// Pods deleted during teardown, in deletion order
    pub deleted_pods: Vec<String>,
    pub replicas: Vec<ReplicaReport>,
    pub reconfiguration: Vec<ReconfigureOutcome>,
}

impl RecoveryReport {
    pub fn elapsed_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    pub fn failed_reconfiguration_steps(&self) -> Vec<&str> {
        self.reconfiguration
            .iter()
            .filter(|outcome| !outcome.is_success())
            .map(|outcome| outcome.step.as_str())
            .collect()
    }
}
