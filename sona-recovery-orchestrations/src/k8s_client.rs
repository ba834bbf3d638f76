//! Kubernetes access for the controller cluster's pods

use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, DeleteParams, ListParams};
use kube::Client;
use sona_recovery_models::PodStatus;

/// Get a Kubernetes client
pub async fn get_k8s_client() -> Result<Client> {
    Client::try_default()
        .await
        .context("Failed to create Kubernetes client")
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("platform unavailable: {0}")]
    Unavailable(String),
}

/// Status shown for a pod that has a deletion timestamp
pub const TERMINATING: &str = "Terminating";

/// One row of a pod listing: name, phase and pod IP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodEntry {
    pub name: String,
    pub phase: Option<String>,
    pub pod_ip: Option<String>,
    /// Deletion requested; the old pod keeps its phase and IP until it is gone
    pub terminating: bool,
}

impl PodEntry {
    /// A terminating pod is never `Running`, whatever its phase says
    pub fn status(&self) -> PodStatus {
        if self.terminating {
            return PodStatus::Other(TERMINATING.to_string());
        }
        PodStatus::from_phase(self.phase.as_deref())
    }

    /// Pod IP, treating an empty string or a terminating pod as absent
    pub fn address(&self) -> Option<&str> {
        if self.terminating {
            return None;
        }
        self.pod_ip.as_deref().map(str::trim).filter(|ip| !ip.is_empty())
    }
}

impl From<Pod> for PodEntry {
    fn from(pod: Pod) -> Self {
        let status = pod.status.unwrap_or_default();
        Self {
            terminating: pod.metadata.deletion_timestamp.is_some(),
            name: pod.metadata.name.unwrap_or_default(),
            phase: status.phase,
            pod_ip: status.pod_ip,
        }
    }
}

/// Find the entry whose name is exactly `name`.
///
/// `sona-onos-10` must never stand in for `sona-onos-1`.
pub fn find_exact<'a>(entries: &'a [PodEntry], name: &str) -> Option<&'a PodEntry> {
    entries.iter().find(|entry| entry.name == name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyAbsent,
}

/// Pod operations the recovery run needs from the orchestration platform.
///
/// Results are eventually consistent: a pod may be absent right after
/// deletion and reappear later under the same name.
#[async_trait]
pub trait PodPlatform: Send + Sync {
    /// List every pod in `namespace`
    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodEntry>, PlatformError>;

    /// Request deletion of one pod; a missing pod is not an error
    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<DeleteOutcome, PlatformError>;
}

/// [`PodPlatform`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubePlatform {
    client: Client,
}

impl KubePlatform {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using the ambient kubeconfig or in-cluster service account
    pub async fn try_default() -> Result<Self> {
        Ok(Self::new(get_k8s_client().await?))
    }
}

#[async_trait]
impl PodPlatform for KubePlatform {
    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodEntry>, PlatformError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pod_list = pods.list(&ListParams::default()).await?;

        Ok(pod_list.items.into_iter().map(PodEntry::from).collect())
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<DeleteOutcome, PlatformError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);

        match pods.delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(DeleteOutcome::Deleted),
            Err(kube::Error::Api(response)) if response.code == 404 => Ok(DeleteOutcome::AlreadyAbsent),
            Err(e) => Err(PlatformError::Kube(e)),
        }
    }
}
