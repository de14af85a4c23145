//! Boundary to the remote account API that mints and deletes API keys.
//!
//! The engine only talks to [`RemoteClient`]; clients are built by a
//! [`ClientFactory`] from the configured API token and shared through the
//! [`ClientCache`].

mod cache;
mod packet;

pub use cache::ClientCache;
pub use packet::{PacketClient, PacketClientFactory, DEFAULT_BASE_URL};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Request for a new API key.
///
/// A non-empty `project_id` scopes the key to that project; otherwise the key
/// is account-wide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiKeyCreateRequest {
    pub description: String,
    pub read_only: bool,
    #[serde(skip)]
    pub project_id: Option<String>,
}

/// API key as returned by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiKey {
    pub id: String,
    pub token: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub read_only: bool,
}

/// Failure reported by (or while reaching) the remote API.
///
/// `message` is the remote's own error text where it supplied one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub status: Option<u16>,
    pub message: String,
}

impl RemoteError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "remote API error ({}): {}", status, self.message),
            None => write!(f, "remote API error: {}", self.message),
        }
    }
}

impl std::error::Error for RemoteError {}

/// Operations the engine needs from the remote account API.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn create_api_key(&self, request: &ApiKeyCreateRequest) -> Result<ApiKey, RemoteError>;

    async fn delete_api_key(&self, key_id: &str) -> Result<(), RemoteError>;
}

/// Builds a ready client from the configured API token.
pub trait ClientFactory: Send + Sync {
    fn build(&self, api_token: &str) -> anyhow::Result<Arc<dyn RemoteClient>>;
}
