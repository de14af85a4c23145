use super::Secret;
use dashmap::DashMap;

/// Outstanding leases keyed by lease ID.
///
/// The full [`Secret`], internal data included, lives only here. Callers hold
/// the lease ID and nothing else that renew or revoke would trust. Contents
/// are lost on restart.
#[derive(Default)]
pub struct LeaseTable {
    leases: DashMap<String, Secret>,
}

impl LeaseTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, secret: Secret) {
        self.leases.insert(secret.lease_id.clone(), secret);
    }

    /// Applies `f` to a stored lease and returns the result. `None` when the
    /// lease is unknown.
    pub fn update<F>(&self, lease_id: &str, f: F) -> Option<Secret>
    where
        F: FnOnce(Secret) -> Secret,
    {
        let mut entry = self.leases.get_mut(lease_id)?;
        let updated = f(entry.clone());
        *entry = updated.clone();
        Some(updated)
    }

    /// Removes a lease so no concurrent revoke can pick it up too.
    pub fn take(&self, lease_id: &str) -> Option<Secret> {
        self.leases.remove(lease_id).map(|(_, secret)| secret)
    }

    /// Puts back a lease whose revoke failed, so it can be retried.
    pub fn restore(&self, secret: Secret) {
        self.leases.entry(secret.lease_id.clone()).or_insert(secret);
    }

    #[cfg(test)]
    fn contains(&self, lease_id: &str) -> bool {
        self.leases.contains_key(lease_id)
    }
}
