use super::{ApiKey, ApiKeyCreateRequest, ClientFactory, RemoteClient, RemoteError};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Default Packet API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.packet.net";

const AUTH_HEADER: &str = "X-Auth-Token";

/// HTTP client for the Packet API key endpoints.
///
/// Authenticates every request with the `X-Auth-Token` header.
pub struct PacketClient {
    api_token: String,
    http_client: Client,
    base_url: String,
}

impl PacketClient {
    pub fn new(api_token: String, base_url: String, user_agent: &str) -> anyhow::Result<Self> {
        let http_client = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            api_token,
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn create_url(&self, request: &ApiKeyCreateRequest) -> String {
        match request.project_id.as_deref().filter(|id| !id.is_empty()) {
            Some(project_id) => format!("{}/projects/{}/api-keys", self.base_url, project_id),
            None => format!("{}/user/api-keys", self.base_url),
        }
    }
}

#[async_trait]
impl RemoteClient for PacketClient {
    async fn create_api_key(&self, request: &ApiKeyCreateRequest) -> Result<ApiKey, RemoteError> {
        let url = self.create_url(request);
        debug!(url = %url, read_only = request.read_only, "Creating API key");

        let response = self
            .http_client
            .post(&url)
            .header(AUTH_HEADER, &self.api_token)
            .json(request)
            .send()
            .await
            .map_err(|e| RemoteError::new(None, format!("failed to send create request: {}", e)))?;

        let response = check_response_status(response).await?;
        response.json::<ApiKey>().await.map_err(|e| {
            RemoteError::new(None, format!("failed to parse create response: {}", e))
        })
    }

    async fn delete_api_key(&self, key_id: &str) -> Result<(), RemoteError> {
        let url = format!("{}/api-keys/{}", self.base_url, key_id);
        debug!(url = %url, "Deleting API key");

        let response = self
            .http_client
            .delete(&url)
            .header(AUTH_HEADER, &self.api_token)
            .send()
            .await
            .map_err(|e| RemoteError::new(None, format!("failed to send delete request: {}", e)))?;

        check_response_status(response).await?;
        Ok(())
    }
}

/// Error body shape: `{"errors": ["..."]}`, sometimes `{"error": "..."}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Pass 2xx responses through; turn anything else into a [`RemoteError`]
/// carrying the remote's own message.
async fn check_response_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();

    let message = if !parsed.errors.is_empty() {
        parsed.errors.join("; ")
    } else if let Some(error) = parsed.error {
        error
    } else {
        status
            .canonical_reason()
            .unwrap_or("unexpected response")
            .to_string()
    };

    Err(RemoteError::new(Some(status.as_u16()), message))
}

/// Builds one [`PacketClient`] per API token.
pub struct PacketClientFactory {
    base_url: String,
    user_agent: String,
}

impl PacketClientFactory {
    pub fn new(base_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user_agent: user_agent.into(),
        }
    }
}

impl ClientFactory for PacketClientFactory {
    fn build(&self, api_token: &str) -> anyhow::Result<Arc<dyn RemoteClient>> {
        let client = PacketClient::new(api_token.to_string(), self.base_url.clone(), &self.user_agent)?;
        Ok(Arc::new(client))
    }
}
