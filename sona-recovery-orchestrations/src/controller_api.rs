//! HTTP client for the controller's management API

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use sona_recovery_models::ArpMode;

/// Default management API port
pub const DEFAULT_API_PORT: u16 = 8181;

/// Management API paths
pub mod endpoints {
    use super::ArpMode;

    /// Probed for its status code only: 200 means the apps are activated
    pub const FLOATING_IPS: &str = "/onos/openstacknetworking/management/floatingips/all";

    /// GET exports the node configuration, POST applies one
    pub const NODE_CONFIG: &str = "/onos/openstacknode/configure";

    pub const SYNC_STATES: &str = "/onos/openstacknetworking/management/sync/states";

    pub const SYNC_RULES: &str = "/onos/openstacknetworking/management/sync/rules";

    pub fn arp_mode(mode: ArpMode) -> String {
        format!("/onos/openstacknetworking/management/config/arpmode/{}", mode)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Raw HTTP response: status and body bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("transport error calling {url}: {message}")]
    Transport { url: String, message: String },
}

/// The two request shapes the recovery run sends to a replica
#[async_trait]
pub trait ControllerApi: Send + Sync {
    async fn get(&self, address: &str, path: &str) -> Result<ApiResponse, ApiError>;

    async fn post_json(&self, address: &str, path: &str, body: Vec<u8>) -> Result<ApiResponse, ApiError>;
}

/// [`ControllerApi`] over HTTP with basic authentication
#[derive(Debug, Clone)]
pub struct HttpControllerApi {
    client: reqwest::Client,
    port: u16,
    credentials: Credentials,
}

impl HttpControllerApi {
    pub fn new(port: u16, credentials: Credentials, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            port,
            credentials,
        })
    }

    pub fn url(&self, address: &str, path: &str) -> String {
        format!("http://{}:{}{}", address, self.port, path)
    }

    async fn send(&self, url: String, request: reqwest::RequestBuilder) -> Result<ApiResponse, ApiError> {
        let transport = |e: reqwest::Error| ApiError::Transport {
            url: url.clone(),
            message: e.to_string(),
        };

        let response = request
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .await
            .map_err(transport)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(transport)?.to_vec();

        tracing::debug!(url = %url, status, bytes = body.len(), "Controller API call completed");

        Ok(ApiResponse { status, body })
    }
}

#[async_trait]
impl ControllerApi for HttpControllerApi {
    async fn get(&self, address: &str, path: &str) -> Result<ApiResponse, ApiError> {
        let url = self.url(address, path);
        let request = self.client.get(&url);
        self.send(url, request).await
    }

    async fn post_json(&self, address: &str, path: &str, body: Vec<u8>) -> Result<ApiResponse, ApiError> {
        let url = self.url(address, path);
        let request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        self.send(url, request).await
    }
}
