//! HTTP client for the garden backend REST API.
//!
//! This module provides a client for reading devices and members and for
//! sending control updates. A bearer token is resolved from the configured
//! [`TokenProvider`] before every request.
//!
//! # Example
//!
//! ```no_run
//! use garden_core::client::GardenClient;
//! use garden_core::credentials::StaticToken;
//! use garden_types::ControlUpdate;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GardenClient::new("https://garden.example.com")?
//!     .with_tokens(StaticToken::new("secret"));
//!
//! for device in client.devices().await? {
//!     println!("{} ({} controls)", device.name, device.controls.len());
//! }
//!
//! client
//!     .update_control("esp-1", "c1", &ControlUpdate::manual(true))
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use garden_types::{ControlUpdate, Device, Member};

use crate::credentials::{NoToken, TokenProvider};
use crate::error::{CredentialError, GatewayError};
use crate::gateway::ControlGateway;

/// Default backend base URL.
pub const DEFAULT_BASE_URL: &str = "https://capstone-project-iot-1.onrender.com";

/// HTTP client for the garden backend.
#[derive(Clone)]
pub struct GardenClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl std::fmt::Debug for GardenClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GardenClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The backend is not reachable.
    #[error("Backend not reachable at {url}: {source}")]
    NotReachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// The bearer token could not be resolved.
    #[error(transparent)]
    Credentials(#[from] CredentialError),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

impl From<ClientError> for GatewayError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::ApiError { status, message } => GatewayError::Rejected { status, message },
            ClientError::NotReachable { url, source } => {
                GatewayError::Unreachable(format!("{}: {}", url, source))
            }
            ClientError::Credentials(e) => GatewayError::Credentials(e),
            other => GatewayError::Other(other.to_string()),
        }
    }
}

/// Responses are either bare or wrapped in a `data` field.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(inner) => inner,
        }
    }
}

#[derive(Serialize)]
struct RenameBody<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct MemberRef<'a> {
    #[serde(rename = "userId")]
    user_id: &'a str,
}

impl GardenClient {
    /// Create a new client with a 10 second request timeout and no token.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The backend base URL (e.g., "https://garden.example.com")
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(ClientError::Request)?;

        Self::with_client(base_url, client)
    }

    /// Create a client with a custom reqwest Client.
    pub fn with_client(base_url: &str, client: Client) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        Ok(Self {
            client,
            base_url,
            tokens: Arc::new(NoToken),
        })
    }

    /// Use `provider` to resolve the bearer token for every request.
    pub fn with_tokens(mut self, provider: impl TokenProvider + 'static) -> Self {
        self.tokens = Arc::new(provider);
        self
    }

    /// Use a shared token provider.
    pub fn with_shared_tokens(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.tokens = provider;
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Devices visible to the current user.
    pub async fn devices(&self) -> Result<Vec<Device>> {
        let url = format!("{}/api/user/getGardenby", self.base_url);
        self.send(self.client.get(&url), &url).await
    }

    /// Full detail of one device, including sensors and controls.
    pub async fn device(&self, device_id: &str) -> Result<Device> {
        let url = format!("{}/api/device/detailDeviceBy/{}", self.base_url, device_id);
        self.send(self.client.get(&url), &url).await
    }

    /// Garden summary for a device, returned as raw JSON.
    pub async fn garden(&self, device_id: &str) -> Result<serde_json::Value> {
        let url = format!("{}/api/garden/{}", self.base_url, device_id);
        self.send(self.client.post(&url), &url).await
    }

    /// Set the status and mode of a control.
    pub async fn update_control(
        &self,
        device_id: &str,
        control_id: &str,
        update: &ControlUpdate,
    ) -> Result<()> {
        let url = format!(
            "{}/api/control/updateControl/{}/{}",
            self.base_url, device_id, control_id
        );
        self.send_unit(self.client.put(&url).json(update), &url).await
    }

    /// Rename a device.
    pub async fn rename_device(&self, device_id: &str, name: &str) -> Result<()> {
        let url = format!("{}/api/device/updateName/{}", self.base_url, device_id);
        self.send_unit(self.client.patch(&url).json(&RenameBody { name }), &url)
            .await
    }

    /// Members with access to a device.
    pub async fn members(&self, device_id: &str) -> Result<Vec<Member>> {
        let url = format!("{}/api/device/membersDetail/{}", self.base_url, device_id);
        self.send(self.client.get(&url), &url).await
    }

    /// Add members to a device. The body is forwarded as-is.
    pub async fn add_members<B: Serialize + ?Sized>(&self, device_id: &str, members: &B) -> Result<()> {
        let url = format!("{}/api/device/addMember/{}", self.base_url, device_id);
        self.send_unit(self.client.post(&url).json(members), &url).await
    }

    /// Remove a member from a device.
    pub async fn remove_member(&self, device_id: &str, member_id: &str) -> Result<()> {
        let url = format!(
            "{}/api/device/delMember/{}/{}",
            self.base_url, device_id, member_id
        );
        self.send_unit(self.client.delete(&url), &url).await
    }

    /// Change a member's role on a device.
    pub async fn update_member_role(&self, device_id: &str, member_id: &str) -> Result<()> {
        let url = format!(
            "{}/api/device/updateMember/{}/{}",
            self.base_url, device_id, member_id
        );
        self.send_unit(self.client.put(&url), &url).await
    }

    /// Members blocked from a device.
    pub async fn blocked_members(&self, device_id: &str) -> Result<Vec<Member>> {
        let url = format!("{}/api/device/blocksDetail/{}", self.base_url, device_id);
        self.send(self.client.get(&url), &url).await
    }

    /// Block a user from a device.
    pub async fn block_member(&self, device_id: &str, member_id: &str) -> Result<()> {
        let url = format!("{}/api/device/addBlock/{}", self.base_url, device_id);
        let body = MemberRef { user_id: member_id };
        self.send_unit(self.client.post(&url).json(&body), &url).await
    }

    /// Lift a block on a user.
    pub async fn unblock_member(&self, device_id: &str, member_id: &str) -> Result<()> {
        let url = format!("{}/api/device/delBlock/{}", self.base_url, device_id);
        let body = MemberRef { user_id: member_id };
        self.send_unit(self.client.delete(&url).json(&body), &url).await
    }

    // ======================================================================
    // Internal HTTP helpers
    // ======================================================================

    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(match self.tokens.current_token().await? {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    async fn dispatch(&self, request: RequestBuilder, url: &str) -> Result<reqwest::Response> {
        let request = self.authorize(request).await?;
        debug!("Sending request to {}", url);
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::NotReachable {
                url: url.to_string(),
                source: e,
            })?;
        check_status(response).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> Result<T> {
        let response = self.dispatch(request, url).await?;
        let envelope: Envelope<T> = response.json().await.map_err(ClientError::Request)?;
        Ok(envelope.into_inner())
    }

    async fn send_unit(&self, request: RequestBuilder, url: &str) -> Result<()> {
        self.dispatch(request, url).await.map(|_| ())
    }
}

#[async_trait]
impl ControlGateway for GardenClient {
    async fn update_control(
        &self,
        device_id: &str,
        control_id: &str,
        update: &ControlUpdate,
    ) -> std::result::Result<(), GatewayError> {
        GardenClient::update_control(self, device_id, control_id, update)
            .await
            .map_err(GatewayError::from)
    }
}

fn normalize_base_url(base_url: &str) -> Result<String> {
    // Normalize URL (remove trailing slash)
    let base_url = base_url.trim_end_matches('/').to_string();

    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ClientError::InvalidUrl(format!(
            "URL must start with http:// or https://, got: {}",
            base_url
        )));
    }

    Ok(base_url)
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| status.to_string());

    Err(ClientError::ApiError {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = GardenClient::new("http://localhost:8000");
        assert!(client.is_ok());

        let client = client.unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_client_normalizes_url() {
        let client = GardenClient::new("https://garden.example.com/").unwrap();
        assert_eq!(client.base_url(), "https://garden.example.com");
    }

    #[test]
    fn test_client_invalid_url() {
        let result = GardenClient::new("localhost:8000");
        assert!(matches!(result, Err(ClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_envelope_accepts_wrapped_and_bare() {
        let wrapped: Envelope<Vec<u32>> = serde_json::from_str(r#"{"data": [1, 2]}"#).unwrap();
        assert_eq!(wrapped.into_inner(), vec![1, 2]);

        let bare: Envelope<Vec<u32>> = serde_json::from_str("[3]").unwrap();
        assert_eq!(bare.into_inner(), vec![3]);
    }

    #[test]
    fn test_api_error_maps_to_rejection() {
        let err = ClientError::ApiError {
            status: 401,
            message: "jwt expired".into(),
        };
        let gateway: GatewayError = err.into();
        assert_eq!(gateway.status(), Some(401));
        assert!(gateway.to_string().contains("jwt expired"));
    }

    #[test]
    fn test_credential_error_maps_through() {
        let gateway: GatewayError = ClientError::Credentials(CredentialError::Missing).into();
        assert!(matches!(gateway, GatewayError::Credentials(CredentialError::Missing)));
    }
}
