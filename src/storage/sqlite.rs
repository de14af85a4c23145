//! SQLite-backed storage with optional seal-wrap.
//!
//! Keys named in `sealed_keys` are encrypted at rest with AES-256-GCM when the
//! store is opened with a seal key. A `sealed_keys` entry ending in `/` seals
//! every key under that prefix; any other entry seals that exact key.

use super::{children_of, encryption, Storage, StorageEntry};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// Persists entries in a single SQLite table.
///
/// # Schema
/// ```sql
/// CREATE TABLE entries (
///     key        TEXT PRIMARY KEY,
///     value      BLOB NOT NULL,  -- base64 ciphertext when sealed
///     nonce      TEXT,           -- set only for sealed entries
///     updated_at TEXT NOT NULL   -- RFC 3339
/// );
/// ```
pub struct SqliteStorage {
    conn: Mutex<Connection>,
    seal_key: Option<Vec<u8>>,
    sealed_keys: Vec<String>,
}

impl SqliteStorage {
    /// Opens (or creates) a plain store. `":memory:"` gives a throwaway database.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref()).with_context(|| {
            format!("Failed to open storage DB at {}", db_path.as_ref().display())
        })?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS entries (
                key        TEXT PRIMARY KEY,
                value      BLOB NOT NULL,
                nonce      TEXT,
                updated_at TEXT NOT NULL
            );",
        )
        .context("Failed to create entries table")?;

        Ok(Self {
            conn: Mutex::new(conn),
            seal_key: None,
            sealed_keys: Vec::new(),
        })
    }

    /// Opens a store that encrypts `sealed_keys` with the base64 `seal_key`.
    pub fn with_seal<P: AsRef<Path>>(
        db_path: P,
        seal_key: &str,
        sealed_keys: Vec<String>,
    ) -> Result<Self> {
        let key = encryption::validate_key(seal_key).context("Invalid seal key")?;
        let mut store = Self::new(db_path)?;
        store.seal_key = Some(key);
        store.sealed_keys = sealed_keys;
        Ok(store)
    }

    fn is_sealed(&self, key: &str) -> bool {
        self.sealed_keys.iter().any(|sealed| {
            if sealed.ends_with('/') {
                key.starts_with(sealed.as_str())
            } else {
                key == sealed
            }
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Storage connection lock poisoned"))
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn get(&self, key: &str) -> Result<Option<StorageEntry>> {
        let row: Option<(Vec<u8>, Option<String>)> = self
            .lock()?
            .query_row(
                "SELECT value, nonce FROM entries WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .with_context(|| format!("Failed to read storage entry {}", key))?;

        let Some((value, nonce)) = row else {
            return Ok(None);
        };

        let value = match nonce {
            Some(nonce) => {
                let seal_key = self.seal_key.as_deref().ok_or_else(|| {
                    anyhow!("Storage entry {} is sealed but no seal key is configured", key)
                })?;
                let ciphertext =
                    String::from_utf8(value).context("Sealed entry is not valid base64 text")?;
                encryption::decrypt(&ciphertext, &nonce, seal_key)
                    .with_context(|| format!("Failed to unseal storage entry {}", key))?
            }
            None => value,
        };

        Ok(Some(StorageEntry {
            key: key.to_string(),
            value,
        }))
    }

    async fn put(&self, entry: StorageEntry) -> Result<()> {
        let (value, nonce) = match &self.seal_key {
            Some(seal_key) if self.is_sealed(&entry.key) => {
                let (ciphertext, nonce) = encryption::encrypt(&entry.value, seal_key)
                    .with_context(|| format!("Failed to seal storage entry {}", entry.key))?;
                (ciphertext.into_bytes(), Some(nonce))
            }
            _ => (entry.value, None),
        };

        self.lock()?
            .execute(
                "INSERT INTO entries (key, value, nonce, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    nonce = excluded.nonce,
                    updated_at = excluded.updated_at",
                params![entry.key, value, nonce, Utc::now().to_rfc3339()],
            )
            .with_context(|| format!("Failed to write storage entry {}", entry.key))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.lock()?
            .execute("DELETE FROM entries WHERE key = ?1", params![key])
            .with_context(|| format!("Failed to delete storage entry {}", key))?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT key FROM entries WHERE substr(key, 1, length(?1)) = ?1")
            .context("Failed to prepare list query")?;
        let keys = stmt
            .query_map(params![prefix], |row| row.get::<_, String>(0))
            .context("Failed to execute list query")?
            .collect::<Result<Vec<String>, _>>()
            .context("Failed to read list results")?;

        Ok(children_of(prefix, keys.iter().map(String::as_str)))
    }
}
