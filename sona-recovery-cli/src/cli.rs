use std::path::PathBuf;

use clap::{ArgAction, Parser};
use sona_recovery_models::ArpMode;

/// SONA Recovery - rebuild a SONA controller cluster from a configuration backup
///
/// Backs up the node configuration, deletes every controller pod, waits for
/// the pods and applications to come back, then restores the configuration.
/// Unset flags fall back to the SONA_* environment variables.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, disable_help_flag = true)]
pub struct Args {
    /// Print help
    #[arg(short = 'h', long, short_alias = '?', action = ArgAction::Help)]
    pub help: Option<bool>,

    /// Kubernetes namespace (default: "default")
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Cluster manager pod name (default: "sona-atomix-1")
    #[arg(long)]
    pub cluster_manager: Option<String>,

    /// Controller replica pod name; repeat for each replica, first one is the control point
    #[arg(long = "replica")]
    pub replicas: Vec<String>,

    /// Controller REST API port (default: 8181)
    #[arg(long)]
    pub api_port: Option<u16>,

    /// ARP mode applied after restore: broadcast or proxy
    #[arg(long)]
    pub arp_mode: Option<ArpMode>,

    /// Configuration snapshot file (default: "network-cfg.json")
    #[arg(long)]
    pub snapshot_path: Option<PathBuf>,

    /// Seconds between readiness polls (default: 5)
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Give up on a pod that is not Running after this many seconds
    #[arg(long)]
    pub pod_timeout: Option<u64>,

    /// Give up on applications that are not active after this many seconds
    #[arg(long)]
    pub app_timeout: Option<u64>,

    /// Also wait for the cluster manager pod before the replicas
    #[arg(long)]
    pub wait_cluster_manager: bool,

    /// Wait on all replicas concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub output: String,
}
