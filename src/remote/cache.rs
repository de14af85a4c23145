//! Lazily built, shared remote client.
//!
//! Steady-state requests only take the read lock. Building takes the write lock
//! and re-checks, so concurrent first callers share one client. A generation
//! counter, bumped by [`ClientCache::invalidate`], makes a builder that loaded
//! configuration before an invalidation start over instead of caching a client
//! built from the superseded token.

use super::{ClientFactory, RemoteClient};
use crate::backend::config::load_config;
use crate::error::{BackendError, Result};
use crate::storage::Storage;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

#[derive(Default)]
struct CacheState {
    client: Option<Arc<dyn RemoteClient>>,
    generation: u64,
}

pub struct ClientCache {
    factory: Arc<dyn ClientFactory>,
    state: RwLock<CacheState>,
}

impl ClientCache {
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            factory,
            state: RwLock::new(CacheState::default()),
        }
    }

    /// Returns the cached client, building it from the stored configuration
    /// on first use.
    ///
    /// Fails with [`BackendError::Configuration`] when no configuration exists.
    pub async fn get_client(&self, storage: &dyn Storage) -> Result<Arc<dyn RemoteClient>> {
        loop {
            let generation = {
                let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
                if let Some(client) = &state.client {
                    return Ok(Arc::clone(client));
                }
                state.generation
            };

            let config = load_config(storage)
                .await?
                .ok_or_else(|| BackendError::Configuration("setup the config first".to_string()))?;

            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

            // Another caller built it while we were loading.
            if let Some(client) = &state.client {
                return Ok(Arc::clone(client));
            }

            if state.generation != generation {
                debug!("Configuration changed while building client, retrying");
                continue;
            }

            let client = self.factory.build(&config.api_token)?;
            state.client = Some(Arc::clone(&client));
            info!("Remote client built");
            return Ok(client);
        }
    }

    /// Drops the cached client. The next [`get_client`](Self::get_client)
    /// rebuilds it from the current configuration.
    pub fn invalidate(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.client = None;
        state.generation = state.generation.wrapping_add(1);
        info!("Remote client invalidated");
    }

    pub fn is_cached(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .client
            .is_some()
    }
}
