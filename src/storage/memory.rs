use super::{children_of, Storage, StorageEntry};
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

/// In-memory storage. Contents are lost on restart.
#[derive(Default)]
pub struct InmemStorage {
    entries: DashMap<String, Vec<u8>>,
}

impl InmemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Storage for InmemStorage {
    async fn get(&self, key: &str) -> Result<Option<StorageEntry>> {
        Ok(self.entries.get(key).map(|value| StorageEntry {
            key: key.to_string(),
            value: value.clone(),
        }))
    }

    async fn put(&self, entry: StorageEntry) -> Result<()> {
        self.entries.insert(entry.key, entry.value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        Ok(children_of(prefix, keys.iter().map(String::as_str)))
    }
}
