//! The `config` entry: the API token used to build the remote client.

use super::Backend;
use crate::error::{BackendError, Result};
use crate::storage::{Storage, StorageEntry};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Storage key of the configuration singleton.
pub const CONFIG_KEY: &str = "config";

/// Persisted engine configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub api_token: String,
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("api_token", &mask_token(&self.api_token))
            .finish()
    }
}

/// Body of a configuration write.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigUpdate {
    pub api_token: Option<String>,
}

/// Operator view of the configuration. The token is masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub api_token: String,
}

pub(crate) async fn load_config(storage: &dyn Storage) -> anyhow::Result<Option<EngineConfig>> {
    match storage.get(CONFIG_KEY).await? {
        Some(entry) => Ok(Some(entry.decode_json()?)),
        None => Ok(None),
    }
}

pub(crate) async fn save_config(storage: &dyn Storage, config: &EngineConfig) -> anyhow::Result<()> {
    storage.put(StorageEntry::json(CONFIG_KEY, config)?).await
}

/// Keeps the last four characters of a token.
fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let visible = if chars.len() > 4 { 4 } else { 0 };
    let hidden = chars.len() - visible;
    "*".repeat(hidden) + &chars[hidden..].iter().collect::<String>()
}

impl Backend {
    /// Stores a new API token and drops the cached client before returning,
    /// so no later request can use a client built from the old token.
    pub async fn update_config(&self, update: ConfigUpdate) -> Result<()> {
        let api_token = update
            .api_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| BackendError::validation("api_token is required"))?;

        save_config(self.storage.as_ref(), &EngineConfig { api_token }).await?;
        self.clients.invalidate();

        info!("Configuration updated");
        Ok(())
    }

    /// Masked configuration, or `Ok(None)` when unconfigured.
    pub async fn read_config(&self) -> Result<Option<ConfigResponse>> {
        Ok(load_config(self.storage.as_ref())
            .await?
            .map(|config| ConfigResponse {
                api_token: mask_token(&config.api_token),
            }))
    }
}
