use super::Backend;
use crate::error::{BackendError, Result};
use crate::lease::{CredentialData, InternalData, Secret, SECRET_TYPE};
use crate::remote::ApiKeyCreateRequest;
use crate::role::{normalize_name, RoleType};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

/// Prefix of the description given to every minted key, so keys are
/// attributable to the role that minted them.
pub const KEY_DESCRIPTION_PREFIX: &str = "packet-secrets-";

impl Backend {
    /// Mints a new API key for `role_name` and wraps it in a leased secret.
    ///
    /// An undefined role yields `Ok(None)` rather than an error, and nothing
    /// is minted.
    pub async fn issue_credentials(&self, role_name: &str) -> Result<Option<Secret>> {
        if role_name.trim().is_empty() {
            return Err(BackendError::validation("missing role name"));
        }
        let name = normalize_name(role_name)?;

        let Some(role) = self.roles.get(&name).await? else {
            warn!(role = %name, "Role doesn't exist, no credentials issued");
            return Ok(None);
        };

        let client = self.clients.get_client(self.storage.as_ref()).await?;

        let request = ApiKeyCreateRequest {
            description: format!("{}{}", KEY_DESCRIPTION_PREFIX, name),
            read_only: role.read_only,
            project_id: match role.role_type {
                RoleType::Project => Some(role.project_id.clone()),
                RoleType::User => None,
            },
        };
        let key = client.create_api_key(&request).await?;

        let secret = Secret {
            lease_id: format!("creds/{}/{}", name, Uuid::new_v4()),
            secret_type: SECRET_TYPE.to_string(),
            data: CredentialData {
                api_key_token: key.token,
            },
            internal_data: InternalData {
                api_key_id: Some(key.id),
                role: Some(name.clone()),
            },
            ttl: role.ttl,
            max_ttl: role.max_ttl,
            renewable: true,
            issued_at: Utc::now(),
        };

        info!(
            role = %name,
            lease_id = %secret.lease_id,
            key_id = ?secret.internal_data.api_key_id,
            ttl_secs = secret.ttl.as_secs(),
            max_ttl_secs = secret.max_ttl.as_secs(),
            "Credentials issued"
        );
        Ok(Some(secret))
    }
}
