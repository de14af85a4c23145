//! Role persistence under `role/<name>`.

use super::{normalize_name, Role, RoleResponse, RoleType, RoleUpdate, ROLE_PREFIX};
use crate::error::{BackendError, Result};
use crate::storage::{Storage, StorageEntry};
use std::sync::Arc;
use tracing::{debug, info};

/// How a role write treats a missing role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Create when missing, merge into the stored role otherwise.
    CreateOrUpdate,
    /// Fail when the role does not exist yet.
    UpdateOnly,
}

/// Validates and persists roles. Holds no state beyond its storage handle.
#[derive(Clone)]
pub struct RoleStore {
    storage: Arc<dyn Storage>,
}

impl RoleStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Loads a role. `Ok(None)` when it does not exist.
    pub async fn get(&self, name: &str) -> Result<Option<Role>> {
        let name = normalize_name(name)?;
        self.load(&name).await
    }

    /// Whether a role with this name is stored. Lets callers pick create vs update.
    pub async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.get(name).await?.is_some())
    }

    /// Merges `update` into the stored role (or a new one) and persists it.
    ///
    /// Every check runs before the write, so a rejected update leaves storage untouched.
    pub async fn write(&self, name: &str, update: RoleUpdate, mode: WriteMode) -> Result<()> {
        let name = normalize_name(name)?;

        let mut role = match (self.load(&name).await?, mode) {
            (Some(role), _) => role,
            (None, WriteMode::UpdateOnly) => {
                return Err(BackendError::Validation(format!(
                    "no role found to update for {}",
                    name
                )));
            }
            (None, WriteMode::CreateOrUpdate) => {
                let role_type = update
                    .role_type
                    .as_deref()
                    .ok_or_else(|| BackendError::validation("type is required"))?;
                Role::new(role_type.parse::<RoleType>()?)
            }
        };

        if let Some(role_type) = &update.role_type {
            role.role_type = role_type.parse()?;
        }
        if let Some(read_only) = update.read_only {
            role.read_only = read_only;
        }
        if let Some(project_id) = update.project_id {
            role.project_id = project_id;
        }
        if let Some(ttl) = &update.ttl {
            role.ttl = ttl.to_duration("ttl")?;
        }
        if let Some(max_ttl) = &update.max_ttl {
            role.max_ttl = max_ttl.to_duration("max_ttl")?;
        }

        role.validate()?;

        self.storage
            .put(StorageEntry::json(role_key(&name), &role)?)
            .await?;

        info!(
            role = %name,
            role_type = %role.role_type,
            read_only = role.read_only,
            ttl_secs = role.ttl.as_secs(),
            max_ttl_secs = role.max_ttl.as_secs(),
            "Role written"
        );
        Ok(())
    }

    /// Public fields of a role, or `Ok(None)` when absent.
    pub async fn read(&self, name: &str) -> Result<Option<RoleResponse>> {
        Ok(self.get(name).await?.as_ref().map(RoleResponse::from))
    }

    /// Names of all stored roles.
    pub async fn list(&self) -> Result<Vec<String>> {
        Ok(self.storage.list(ROLE_PREFIX).await?)
    }

    /// Deletes a role. Deleting a missing role succeeds.
    pub async fn delete(&self, name: &str) -> Result<()> {
        let name = normalize_name(name)?;
        self.storage.delete(&role_key(&name)).await?;
        info!(role = %name, "Role deleted");
        Ok(())
    }

    async fn load(&self, name: &str) -> Result<Option<Role>> {
        let Some(entry) = self.storage.get(&role_key(name)).await? else {
            debug!(role = %name, "Role not found");
            return Ok(None);
        };
        Ok(Some(entry.decode_json()?))
    }
}

fn role_key(name: &str) -> String {
    format!("{}{}", ROLE_PREFIX, name)
}
