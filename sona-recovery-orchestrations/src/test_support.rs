//! In-memory platform and controller API used by unit tests

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sona_recovery_models::{ArpMode, PodStatus};
use tokio_util::sync::CancellationToken;

use crate::context::RecoveryContext;
use crate::controller_api::{endpoints, ApiError, ApiResponse, ControllerApi};
use crate::k8s_client::{DeleteOutcome, PlatformError, PodEntry, PodPlatform};
use crate::types::RecoverClusterInput;

/// Ordered record of every call made to either fake
pub(crate) type Journal = Arc<Mutex<Vec<String>>>;

pub(crate) fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub(crate) fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

struct FakePod {
    name: String,
    ip: String,
    recreated_ip: String,
    /// Statuses reported on successive listings after deletion; the last one sticks
    recreation: VecDeque<PodStatus>,
    /// Listings after deletion that still show the old pod, Running but terminating
    termination_window: u32,
    deleted: bool,
}

impl FakePod {
    fn observe(&mut self) -> Option<PodEntry> {
        if !self.deleted {
            return Some(self.original(false));
        }

        if self.termination_window > 0 {
            self.termination_window -= 1;
            return Some(self.original(true));
        }

        let status = if self.recreation.len() > 1 {
            self.recreation.pop_front()
        } else {
            self.recreation.front().cloned()
        }
        .unwrap_or(PodStatus::Running);

        let (phase, pod_ip) = match status {
            PodStatus::Absent => return None,
            PodStatus::Pending => (Some("Pending".to_string()), None),
            PodStatus::Running => (Some("Running".to_string()), Some(self.recreated_ip.clone())),
            PodStatus::Other(phase) => (Some(phase), None),
        };

        Some(PodEntry {
            name: self.name.clone(),
            phase,
            pod_ip,
            terminating: false,
        })
    }

    fn original(&self, terminating: bool) -> PodEntry {
        PodEntry {
            name: self.name.clone(),
            phase: Some("Running".to_string()),
            pod_ip: Some(self.ip.clone()),
            terminating,
        }
    }
}

pub(crate) struct FakePlatform {
    journal: Journal,
    pods: Mutex<Vec<FakePod>>,
    failing_lists: AtomicU32,
    cancel_on_delete: Option<CancellationToken>,
}

impl FakePlatform {
    pub(crate) fn new(journal: Journal) -> Self {
        Self {
            journal,
            pods: Mutex::new(Vec::new()),
            failing_lists: AtomicU32::new(0),
            cancel_on_delete: None,
        }
    }

    /// A running pod that comes back Absent -> Pending -> Running at `recreated_ip`
    pub(crate) fn with_pod(self, name: &str, ip: &str, recreated_ip: &str) -> Self {
        self.pods.lock().unwrap().push(FakePod {
            name: name.to_string(),
            ip: ip.to_string(),
            recreated_ip: recreated_ip.to_string(),
            recreation: VecDeque::from(vec![PodStatus::Absent, PodStatus::Pending, PodStatus::Running]),
            termination_window: 0,
            deleted: false,
        });
        self
    }

    pub(crate) fn with_recreation(self, name: &str, statuses: Vec<PodStatus>) -> Self {
        for pod in self.pods.lock().unwrap().iter_mut().filter(|pod| pod.name == name) {
            pod.recreation = statuses.clone().into();
        }
        self
    }

    /// Keep listing the old pod as terminating for `listings` listings after deletion
    pub(crate) fn with_termination(self, name: &str, listings: u32) -> Self {
        for pod in self.pods.lock().unwrap().iter_mut().filter(|pod| pod.name == name) {
            pod.termination_window = listings;
        }
        self
    }

    /// Fail the next `count` listings with a platform error
    pub(crate) fn with_failing_lists(self, count: u32) -> Self {
        self.failing_lists.store(count, Ordering::SeqCst);
        self
    }

    pub(crate) fn cancel_on_delete(mut self, token: CancellationToken) -> Self {
        self.cancel_on_delete = Some(token);
        self
    }

    /// The standard topology: one cluster manager and three replicas
    pub(crate) fn standard(journal: Journal) -> Self {
        Self::new(journal)
            .with_pod("sona-atomix-1", "10.0.0.100", "10.0.1.100")
            .with_pod("sona-onos-1", "10.0.0.1", "10.0.1.1")
            .with_pod("sona-onos-2", "10.0.0.2", "10.0.1.2")
            .with_pod("sona-onos-3", "10.0.0.3", "10.0.1.3")
    }
}

#[async_trait]
impl PodPlatform for FakePlatform {
    async fn list_pods(&self, _namespace: &str) -> Result<Vec<PodEntry>, PlatformError> {
        self.journal.lock().unwrap().push("list".to_string());

        let failing = self.failing_lists.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_lists.store(failing - 1, Ordering::SeqCst);
            return Err(PlatformError::Unavailable("apiserver timeout".to_string()));
        }

        Ok(self
            .pods
            .lock()
            .unwrap()
            .iter_mut()
            .filter_map(FakePod::observe)
            .collect())
    }

    async fn delete_pod(&self, _namespace: &str, name: &str) -> Result<DeleteOutcome, PlatformError> {
        self.journal.lock().unwrap().push(format!("delete {}", name));

        if let Some(token) = &self.cancel_on_delete {
            token.cancel();
        }

        let mut pods = self.pods.lock().unwrap();
        match pods.iter_mut().find(|pod| pod.name == name) {
            Some(pod) if !pod.deleted => {
                pod.deleted = true;
                Ok(DeleteOutcome::Deleted)
            }
            _ => Ok(DeleteOutcome::AlreadyAbsent),
        }
    }
}

/// Scripted failure for one API path
#[derive(Clone)]
pub(crate) enum Failure {
    Status(u16),
    Transport,
}

pub(crate) struct FakeControllerApi {
    journal: Journal,
    config_body: Mutex<Option<Vec<u8>>>,
    /// Activation probe statuses per address; the last one sticks
    probes: Mutex<HashMap<String, VecDeque<u16>>>,
    failures: Mutex<HashMap<String, Failure>>,
    posted: Mutex<Vec<(String, Vec<u8>)>>,
}

impl FakeControllerApi {
    /// Backup returns `config_body`; `None` makes the backup call fail in transport
    pub(crate) fn new(journal: Journal, config_body: Option<&[u8]>) -> Self {
        Self {
            journal,
            config_body: Mutex::new(config_body.map(<[u8]>::to_vec)),
            probes: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            posted: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_probes(self, address: &str, statuses: &[u16]) -> Self {
        self.probes
            .lock()
            .unwrap()
            .insert(address.to_string(), statuses.iter().copied().collect());
        self
    }

    /// Script a failure for `method` ("GET" or "POST") on `path`
    pub(crate) fn with_failure(self, method: &str, path: &str, failure: Failure) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(format!("{} {}", method, path), failure);
        self
    }

    pub(crate) fn set_config_body(&self, body: &[u8]) {
        *self.config_body.lock().unwrap() = Some(body.to_vec());
    }

    /// Bodies POSTed so far, with their target address
    pub(crate) fn posted(&self) -> Vec<(String, Vec<u8>)> {
        self.posted.lock().unwrap().clone()
    }

    fn transport(address: &str, path: &str) -> ApiError {
        ApiError::Transport {
            url: format!("http://{}:8181{}", address, path),
            message: "connection refused".to_string(),
        }
    }

    fn scripted(&self, method: &str, address: &str, path: &str) -> Option<Result<ApiResponse, ApiError>> {
        let failure = self.failures.lock().unwrap().get(&format!("{} {}", method, path)).cloned()?;
        Some(match failure {
            Failure::Status(status) => Ok(ApiResponse {
                status,
                body: Vec::new(),
            }),
            Failure::Transport => Err(Self::transport(address, path)),
        })
    }

    fn ok() -> Result<ApiResponse, ApiError> {
        Ok(ApiResponse {
            status: 200,
            body: Vec::new(),
        })
    }
}

#[async_trait]
impl ControllerApi for FakeControllerApi {
    async fn get(&self, address: &str, path: &str) -> Result<ApiResponse, ApiError> {
        self.journal.lock().unwrap().push(format!("GET {}{}", address, path));

        if let Some(result) = self.scripted("GET", address, path) {
            return result;
        }

        match path {
            endpoints::NODE_CONFIG => match self.config_body.lock().unwrap().clone() {
                Some(body) => Ok(ApiResponse { status: 200, body }),
                None => Err(Self::transport(address, path)),
            },
            endpoints::FLOATING_IPS => {
                let mut probes = self.probes.lock().unwrap();
                let status = match probes.get_mut(address) {
                    Some(script) if script.len() > 1 => script.pop_front().unwrap_or(200),
                    Some(script) => script.front().copied().unwrap_or(200),
                    None => 200,
                };
                Ok(ApiResponse {
                    status,
                    body: Vec::new(),
                })
            }
            _ => Self::ok(),
        }
    }

    async fn post_json(&self, address: &str, path: &str, body: Vec<u8>) -> Result<ApiResponse, ApiError> {
        self.journal.lock().unwrap().push(format!("POST {}{}", address, path));
        self.posted.lock().unwrap().push((address.to_string(), body));
        self.scripted("POST", address, path).unwrap_or_else(Self::ok)
    }
}

pub(crate) fn context(platform: FakePlatform, api: Arc<FakeControllerApi>) -> RecoveryContext {
    RecoveryContext::new(Arc::new(platform), api)
}

/// Input for the standard topology with millisecond polling
pub(crate) fn standard_input(snapshot_dir: &Path) -> RecoverClusterInput {
    RecoverClusterInput {
        namespace: "default".to_string(),
        cluster_manager: "sona-atomix-1".to_string(),
        replicas: vec![
            "sona-onos-1".to_string(),
            "sona-onos-2".to_string(),
            "sona-onos-3".to_string(),
        ],
        arp_mode: ArpMode::Broadcast,
        snapshot_path: snapshot_dir.join("network-cfg.json"),
        poll_interval_ms: 1,
        pod_timeout_seconds: None,
        app_timeout_seconds: None,
        wait_for_cluster_manager: false,
        parallel_waits: false,
    }
}
