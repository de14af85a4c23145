//! The credential engine.
//!
//! [`Backend`] ties the role store, the configuration entry, the shared remote
//! client and the host's lease policy together. Every operation runs to
//! completion within the caller's request; the engine does no background work.
//!
//! ```text
//! request ─► RoleStore (lookup/validate)
//!          ─► ClientCache (shared client, built from `config`)
//!          ─► RemoteClient (create/delete API key)
//!          ─► Secret (public data + internal data + role TTLs)
//! ```

pub(crate) mod config;
mod creds;
mod lease;


pub use config::{ConfigResponse, ConfigUpdate, EngineConfig};
pub use creds::KEY_DESCRIPTION_PREFIX;

use crate::error::Result;
use crate::lease::LeasePolicy;
use crate::remote::{ClientCache, ClientFactory};
use crate::role::{RoleResponse, RoleStore, RoleUpdate, WriteMode};
use crate::storage::Storage;
use std::sync::Arc;

pub struct Backend {
    storage: Arc<dyn Storage>,
    roles: RoleStore,
    clients: ClientCache,
    lease_policy: Arc<dyn LeasePolicy>,
}

impl Backend {
    pub fn new(
        storage: Arc<dyn Storage>,
        factory: Arc<dyn ClientFactory>,
        lease_policy: Arc<dyn LeasePolicy>,
    ) -> Self {
        Self {
            roles: RoleStore::new(Arc::clone(&storage)),
            storage,
            clients: ClientCache::new(factory),
            lease_policy,
        }
    }

    pub fn client_cache(&self) -> &ClientCache {
        &self.clients
    }

    /// Create-or-update in a single load/merge/put.
    pub async fn upsert_role(&self, name: &str, update: RoleUpdate) -> Result<()> {
        self.roles
            .write(name, update, WriteMode::CreateOrUpdate)
            .await
    }

    /// Update-only: fails when the role does not exist.
    pub async fn update_role(&self, name: &str, update: RoleUpdate) -> Result<()> {
        self.roles.write(name, update, WriteMode::UpdateOnly).await
    }

    pub async fn read_role(&self, name: &str) -> Result<Option<RoleResponse>> {
        self.roles.read(name).await
    }

    pub async fn list_roles(&self) -> Result<Vec<String>> {
        self.roles.list().await
    }

    pub async fn delete_role(&self, name: &str) -> Result<()> {
        self.roles.delete(name).await
    }

    pub async fn role_exists(&self, name: &str) -> Result<bool> {
        self.roles.exists(name).await
    }
}
