use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use sona_recovery_models::ArpMode;
use sona_recovery_orchestrations::controller_api::{Credentials, DEFAULT_API_PORT};
use sona_recovery_orchestrations::poll::DEFAULT_POLL_INTERVAL;
use sona_recovery_orchestrations::snapshot::DEFAULT_SNAPSHOT_PATH;
use sona_recovery_orchestrations::RecoverClusterInput;

use crate::cli::Args;

const DEFAULT_NAMESPACE: &str = "default";
const DEFAULT_CLUSTER_MANAGER: &str = "sona-atomix-1";
const DEFAULT_REPLICAS: &str = "sona-onos-1,sona-onos-2,sona-onos-3";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Immutable settings for one recovery run
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    pub namespace: String,
    pub cluster_manager: String,
    pub replicas: Vec<String>,
    pub api_port: u16,
    pub credentials: Credentials,
    pub arp_mode: ArpMode,
    pub snapshot_path: PathBuf,
    pub poll_interval: Duration,
    pub pod_timeout: Option<Duration>,
    pub app_timeout: Option<Duration>,
    pub http_timeout: Duration,
    pub wait_for_cluster_manager: bool,
    pub parallel_waits: bool,
}

impl RecoveryConfig {
    /// Flags first, then SONA_* environment variables, then defaults
    pub fn load(args: &Args) -> Result<Self> {
        Self::from_lookup(args, |key| std::env::var(key).ok())
    }

    pub fn from_lookup(args: &Args, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // Empty variables count as unset
        let env = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let replicas = if args.replicas.is_empty() {
            env("SONA_REPLICAS")
                .unwrap_or_else(|| DEFAULT_REPLICAS.to_string())
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        } else {
            args.replicas.clone()
        };

        let arp_mode = match args.arp_mode {
            Some(mode) => mode,
            None => env("SONA_ARP_MODE")
                .map(|value| ArpMode::from_str(&value).map_err(|e| anyhow!(e)))
                .transpose()
                .context("SONA_ARP_MODE must be broadcast or proxy")?
                .unwrap_or_default(),
        };

        let poll_secs = match args.poll_interval {
            Some(secs) => Some(secs),
            None => parse_env(&env, "SONA_POLL_INTERVAL_SECS")?,
        };

        Ok(Self {
            namespace: args
                .namespace
                .clone()
                .or_else(|| env("SONA_NAMESPACE"))
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            cluster_manager: args
                .cluster_manager
                .clone()
                .or_else(|| env("SONA_CLUSTER_MANAGER"))
                .unwrap_or_else(|| DEFAULT_CLUSTER_MANAGER.to_string()),
            replicas,
            api_port: match args.api_port {
                Some(port) => port,
                None => parse_env(&env, "SONA_API_PORT")?.unwrap_or(DEFAULT_API_PORT),
            },
            credentials: Credentials::new(
                env("SONA_API_USER").unwrap_or_else(|| "onos".to_string()),
                env("SONA_API_PASSWORD").unwrap_or_else(|| "rocks".to_string()),
            ),
            arp_mode,
            snapshot_path: args
                .snapshot_path
                .clone()
                .or_else(|| env("SONA_SNAPSHOT_PATH").map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_PATH)),
            poll_interval: poll_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            pod_timeout: match args.pod_timeout {
                Some(secs) => Some(secs),
                None => parse_env(&env, "SONA_POD_TIMEOUT_SECS")?,
            }
            .map(Duration::from_secs),
            app_timeout: match args.app_timeout {
                Some(secs) => Some(secs),
                None => parse_env(&env, "SONA_APP_TIMEOUT_SECS")?,
            }
            .map(Duration::from_secs),
            http_timeout: Duration::from_secs(
                parse_env(&env, "SONA_HTTP_TIMEOUT_SECS")?.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
            wait_for_cluster_manager: args.wait_cluster_manager
                || parse_flag(&env, "SONA_WAIT_FOR_CLUSTER_MANAGER")?,
            parallel_waits: args.parallel || parse_flag(&env, "SONA_PARALLEL_WAITS")?,
        })
    }

    pub fn to_input(&self) -> RecoverClusterInput {
        RecoverClusterInput {
            namespace: self.namespace.clone(),
            cluster_manager: self.cluster_manager.clone(),
            replicas: self.replicas.clone(),
            arp_mode: self.arp_mode,
            snapshot_path: self.snapshot_path.clone(),
            poll_interval_ms: self.poll_interval.as_millis() as u64,
            pod_timeout_seconds: self.pod_timeout.map(|timeout| timeout.as_secs()),
            app_timeout_seconds: self.app_timeout.map(|timeout| timeout.as_secs()),
            wait_for_cluster_manager: self.wait_for_cluster_manager,
            parallel_waits: self.parallel_waits,
        }
    }
}

fn parse_env<T>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env(key)
        .map(|value| value.trim().parse::<T>())
        .transpose()
        .with_context(|| format!("{} must be a valid number", key))
}

fn parse_flag(env: &impl Fn(&str) -> Option<String>, key: &str) -> Result<bool> {
    match env(key) {
        None => Ok(false),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(anyhow!("{} must be true or false, got '{}'", key, value)),
        },
    }
}
