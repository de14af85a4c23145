//! Leased secrets.
//!
//! A [`Secret`] carries two sections: `data`, which the end caller sees, and
//! `internal_data`, which only this engine reads back on renew/revoke. Callers
//! get a [`LeaseView`]; the full secret stays in a [`LeaseTable`]. The host
//! owns the lease clock; the engine only asks it for the default and maximum
//! lease durations through [`LeasePolicy`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

mod table;

pub use table::LeaseTable;

/// Secret type tag for API keys minted by this engine.
pub const SECRET_TYPE: &str = "packet";

/// Caller-visible part of an issued secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialData {
    pub api_key_token: String,
}

/// Engine-only part of an issued secret.
///
/// `api_key_id` is optional so that a lease missing it can be represented and
/// refused on revoke instead of failing to parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// A lease-bearing secret.
///
/// `ttl`/`max_ttl` of zero mean "use the mount defaults".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    pub lease_id: String,
    pub secret_type: String,
    pub data: CredentialData,
    #[serde(default)]
    pub internal_data: InternalData,
    #[serde(with = "secs")]
    pub ttl: Duration,
    #[serde(with = "secs")]
    pub max_ttl: Duration,
    pub renewable: bool,
    pub issued_at: DateTime<Utc>,
}

/// What the end caller receives for a lease. Internal data stays behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseView {
    pub lease_id: String,
    pub data: CredentialData,
    #[serde(with = "secs")]
    pub ttl: Duration,
    #[serde(with = "secs")]
    pub max_ttl: Duration,
    pub renewable: bool,
}

impl From<&Secret> for LeaseView {
    fn from(secret: &Secret) -> Self {
        Self {
            lease_id: secret.lease_id.clone(),
            data: secret.data.clone(),
            ttl: secret.ttl,
            max_ttl: secret.max_ttl,
            renewable: secret.renewable,
        }
    }
}

/// Host capability: system-wide lease durations.
pub trait LeasePolicy: Send + Sync {
    fn default_lease_ttl(&self) -> Duration;
    fn max_lease_ttl(&self) -> Duration;
}

/// Fixed lease durations.
#[derive(Debug, Clone, Copy)]
pub struct StaticLeasePolicy {
    pub default_ttl: Duration,
    pub max_ttl: Duration,
}

impl LeasePolicy for StaticLeasePolicy {
    fn default_lease_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn max_lease_ttl(&self) -> Duration {
        self.max_ttl
    }
}

/// Default and max lease durations, with max raised to default when the host
/// reports a default above its max.
pub fn default_and_max(policy: &dyn LeasePolicy) -> (Duration, Duration) {
    let default_ttl = policy.default_lease_ttl();
    let max_ttl = policy.max_lease_ttl().max(default_ttl);
    (default_ttl, max_ttl)
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
