use super::Backend;
use crate::error::{BackendError, Result};
use crate::lease::{default_and_max, Secret};
use tracing::info;

impl Backend {
    /// Resets the lease window to the host's current default/max durations.
    ///
    /// Local bookkeeping only: the remote key is not touched.
    pub fn renew(&self, mut secret: Secret) -> Secret {
        let (default_ttl, max_ttl) = default_and_max(self.lease_policy.as_ref());
        secret.ttl = default_ttl;
        secret.max_ttl = max_ttl;

        info!(
            lease_id = %secret.lease_id,
            ttl_secs = default_ttl.as_secs(),
            max_ttl_secs = max_ttl.as_secs(),
            "Lease renewed"
        );
        secret
    }

    /// Deletes the remote key behind a lease. Terminal for the lease.
    ///
    /// Any remote failure, including "already deleted", fails the revoke so the
    /// host can retry.
    pub async fn revoke(&self, secret: &Secret) -> Result<()> {
        let key_id = secret
            .internal_data
            .api_key_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                BackendError::InternalData("secret is missing ID of the API token".to_string())
            })?;

        let client = self.clients.get_client(self.storage.as_ref()).await?;
        client.delete_api_key(key_id).await?;

        info!(lease_id = %secret.lease_id, key_id = %key_id, "Lease revoked");
        Ok(())
    }
}
