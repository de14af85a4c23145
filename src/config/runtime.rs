use crate::lease::LeasePolicy;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// System-wide lease durations. Changes via PUT /v1/sys/lease-config apply to
/// the next renew without restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseConfig {
    #[serde(default = "default_ttl_seconds")]
    pub default_ttl_seconds: u64,
    #[serde(default = "max_ttl_seconds")]
    pub max_ttl_seconds: u64,
}

fn default_ttl_seconds() -> u64 {
    3600
}

fn max_ttl_seconds() -> u64 {
    86400
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: default_ttl_seconds(),
            max_ttl_seconds: max_ttl_seconds(),
        }
    }
}

impl LeaseConfig {
    /// Apply env var overrides on top of `self`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("PACKET_SECRETS_DEFAULT_LEASE_TTL") {
            if let Ok(n) = v.parse::<u64>() {
                self.default_ttl_seconds = n;
            }
        }
        if let Ok(v) = std::env::var("PACKET_SECRETS_MAX_LEASE_TTL") {
            if let Ok(n) = v.parse::<u64>() {
                self.max_ttl_seconds = n;
            }
        }
        self
    }
}

pub type SharedLeaseConfig = Arc<RwLock<LeaseConfig>>;

pub fn new_lease_config(config: LeaseConfig) -> SharedLeaseConfig {
    Arc::new(RwLock::new(config))
}

impl LeasePolicy for RwLock<LeaseConfig> {
    fn default_lease_ttl(&self) -> Duration {
        let cfg = self.read().unwrap_or_else(PoisonError::into_inner);
        Duration::from_secs(cfg.default_ttl_seconds)
    }

    fn max_lease_ttl(&self) -> Duration {
        let cfg = self.read().unwrap_or_else(PoisonError::into_inner);
        Duration::from_secs(cfg.max_ttl_seconds)
    }
}
