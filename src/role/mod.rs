//! Role definitions: what kind of API key to mint, with what scope and lease bounds.

use crate::error::{BackendError, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

mod store;


pub use store::{RoleStore, WriteMode};

/// Storage prefix for role entries.
pub const ROLE_PREFIX: &str = "role/";

/// Version-4 UUID shape. Shape only: no library parse.
static PROJECT_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        "^[a-fA-F0-9]{8}-[a-fA-F0-9]{4}-4[a-fA-F0-9]{3}-[89abAB][a-fA-F0-9]{3}-[a-fA-F0-9]{12}$",
    )
    .expect("project id pattern is valid")
});

static ROLE_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[a-z0-9_]([a-z0-9_.-]*[a-z0-9_])?$").expect("role name pattern is valid")
});

/// Kind of API key a role mints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleType {
    /// Account-wide key. Must not carry a project ID.
    User,
    /// Key restricted to one project.
    Project,
}

impl RoleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleType::User => "user",
            RoleType::Project => "project",
        }
    }
}

impl fmt::Display for RoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleType {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(RoleType::User),
            "project" => Ok(RoleType::Project),
            other => Err(BackendError::Validation(format!(
                "role type should be either {} or {}, was {}",
                RoleType::User,
                RoleType::Project,
                other
            ))),
        }
    }
}

/// A stored role, as persisted under `role/<name>`.
///
/// `ttl`/`max_ttl` of zero defer to the host's default/max lease durations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(rename = "type")]
    pub role_type: RoleType,
    pub read_only: bool,
    #[serde(default)]
    pub project_id: String,
    #[serde(default, with = "duration_secs")]
    pub ttl: Duration,
    #[serde(default, with = "duration_secs")]
    pub max_ttl: Duration,
}

impl Role {
    /// A fresh role of the given type with creation defaults.
    pub fn new(role_type: RoleType) -> Self {
        Self {
            role_type,
            read_only: true,
            project_id: String::new(),
            ttl: Duration::ZERO,
            max_ttl: Duration::ZERO,
        }
    }

    /// Checks the cross-field invariants of a merged role.
    pub fn validate(&self) -> Result<()> {
        match self.role_type {
            RoleType::User if !self.project_id.is_empty() => {
                return Err(BackendError::validation(
                    "for user API key role, project_id must be left empty",
                ));
            }
            RoleType::Project if !is_valid_project_id(&self.project_id) => {
                return Err(BackendError::validation(
                    "for project API key role, you must supply a valid project ID",
                ));
            }
            _ => {}
        }

        if !self.max_ttl.is_zero() && self.ttl > self.max_ttl {
            return Err(BackendError::validation("ttl exceeds max_ttl"));
        }

        Ok(())
    }
}

/// Public view of a role, TTLs in whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleResponse {
    #[serde(rename = "type")]
    pub role_type: RoleType,
    pub read_only: bool,
    pub project_id: String,
    pub ttl: u64,
    pub max_ttl: u64,
}

impl From<&Role> for RoleResponse {
    fn from(role: &Role) -> Self {
        Self {
            role_type: role.role_type,
            read_only: role.read_only,
            project_id: role.project_id.clone(),
            ttl: role.ttl.as_secs(),
            max_ttl: role.max_ttl.as_secs(),
        }
    }
}

/// Fields of a role write. `None` means "not supplied": keep the stored value
/// (or the creation default).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleUpdate {
    #[serde(rename = "type")]
    pub role_type: Option<String>,
    pub read_only: Option<bool>,
    pub project_id: Option<String>,
    pub ttl: Option<TtlInput>,
    pub max_ttl: Option<TtlInput>,
}

/// TTL as supplied by a caller: integer seconds, or a string such as `"90"`,
/// `"30s"`, `"5m"`, `"2h"`, `"1d"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TtlInput {
    Seconds(i64),
    Text(String),
}

impl TtlInput {
    pub fn to_duration(&self, field: &str) -> Result<Duration> {
        match self {
            TtlInput::Seconds(secs) => u64::try_from(*secs)
                .map(Duration::from_secs)
                .map_err(|_| BackendError::Validation(format!("{} must not be negative", field))),
            TtlInput::Text(text) => parse_ttl(text)
                .map_err(|msg| BackendError::Validation(format!("invalid {}: {}", field, msg))),
        }
    }
}

#[cfg(test)]
impl From<u64> for TtlInput {
    fn from(secs: u64) -> Self {
        TtlInput::Seconds(i64::try_from(secs).expect("test ttl fits in i64"))
    }
}

fn parse_ttl(text: &str) -> std::result::Result<Duration, String> {
    let s = text.trim().to_lowercase();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }

    let (digits, multiplier) = match s.chars().last() {
        Some('d') => (&s[..s.len() - 1], 24 * 60 * 60),
        Some('h') => (&s[..s.len() - 1], 60 * 60),
        Some('m') => (&s[..s.len() - 1], 60),
        Some('s') => (&s[..s.len() - 1], 1),
        _ => (s.as_str(), 1),
    };

    let num: u64 = digits
        .parse()
        .map_err(|_| format!("'{}' is not a whole number of s, m, h or d", text))?;
    num.checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or_else(|| "duration is too large".to_string())
}

/// True when `id` has the 8-4-4-4-12 hex shape of a version-4 UUID.
pub fn is_valid_project_id(id: &str) -> bool {
    PROJECT_ID_PATTERN.is_match(id)
}

/// Lowercases a role name and checks it is usable as a storage key segment.
pub fn normalize_name(name: &str) -> Result<String> {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return Err(BackendError::validation("name is required"));
    }
    if !ROLE_NAME_PATTERN.is_match(&name) {
        return Err(BackendError::Validation(format!(
            "invalid role name '{}': use letters, digits, '-', '_' and '.'",
            name
        )));
    }
    Ok(name)
}

mod duration_secs {
    use super::*;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
