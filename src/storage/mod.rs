//! Keyed storage for engine state.
//!
//! The engine persists exactly two key families: `config` (singleton) and
//! `role/<name>`. Each value is a JSON document. Storage gives read-your-writes
//! per key and nothing across keys; no engine operation touches more than one key.
//!
//! # Usage
//!
//! ```
//! use packet_secrets::storage::{InmemStorage, Storage, StorageEntry};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Thing { n: u32 }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let storage = InmemStorage::new();
//! storage.put(StorageEntry::json("things/a", &Thing { n: 1 })?).await?;
//!
//! let entry = storage.get("things/a").await?.expect("written above");
//! let thing: Thing = entry.decode_json()?;
//! assert_eq!(thing.n, 1);
//! assert_eq!(storage.list("things/").await?, vec!["a".to_string()]);
//! # Ok(())
//! # }
//! ```

mod encryption;
mod memory;
mod sqlite;

pub use encryption::{decrypt, encrypt, validate_key};
pub use memory::InmemStorage;
pub use sqlite::SqliteStorage;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeSet;

/// A single stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEntry {
    pub key: String,
    pub value: Vec<u8>,
}

impl StorageEntry {
    /// Encode `value` as JSON under `key`.
    pub fn json<T: Serialize>(key: impl Into<String>, value: &T) -> Result<Self> {
        let key = key.into();
        let value = serde_json::to_vec(value)
            .with_context(|| format!("Failed to encode storage entry {}", key))?;
        Ok(Self { key, value })
    }

    /// Decode the JSON payload.
    pub fn decode_json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.value)
            .with_context(|| format!("Failed to decode storage entry {}", self.key))
    }
}

/// Keyed storage collaborator.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Returns `Ok(None)` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<StorageEntry>>;

    /// Insert or replace.
    async fn put(&self, entry: StorageEntry) -> Result<()>;

    /// Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Immediate children of `prefix`, prefix stripped, sorted.
    /// Nested keys collapse to their first segment with a trailing `/`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Shared listing rule for implementations that can enumerate raw keys.
pub(crate) fn children_of<'a, I>(prefix: &str, keys: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let children: BTreeSet<String> = keys
        .into_iter()
        .filter_map(|key| key.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty())
        .map(|rest| match rest.find('/') {
            Some(i) => rest[..=i].to_string(),
            None => rest.to_string(),
        })
        .collect();
    children.into_iter().collect()
}
