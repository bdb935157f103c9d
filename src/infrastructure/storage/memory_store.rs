//! In-memory key/value store, used when no durable storage is wanted.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::errors::StorageError;
use crate::domain::ports::KeyValueStorePort;

/// Volatile string store with the same quota semantics as the file store.
#[derive(Debug)]
pub struct MemoryKeyValueStore {
    entries: RwLock<BTreeMap<String, String>>,
    quota: u64,
}

impl MemoryKeyValueStore {
    #[must_use]
    pub fn new(quota: u64) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            quota,
        }
    }

    /// Bytes currently used, counting keys and values.
    #[must_use]
    pub fn used_bytes(&self) -> u64 {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| (k.len() + v.len()) as u64)
            .sum()
    }
}

impl Default for MemoryKeyValueStore {
    fn default() -> Self {
        Self::new(super::DEFAULT_QUOTA_BYTES)
    }
}

#[async_trait]
impl KeyValueStorePort for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write();
        let used: u64 = entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| (k.len() + v.len()) as u64)
            .sum();
        let needed = used + (key.len() + value.len()) as u64;
        if needed > self.quota {
            return Err(StorageError::QuotaExceeded {
                needed,
                quota: self.quota,
            });
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_quota_counts_keys_and_values() {
        let store = MemoryKeyValueStore::new(10);

        store.set("ab", "cdef").await.unwrap();
        store.set("ab", "cdefghij").await.unwrap();

        assert_eq!(store.used_bytes(), 10);
        assert!(store.set("x", "y").await.unwrap_err().is_quota_exceeded());
    }

    #[tokio::test]
    async fn test_keys_are_sorted() {
        let store = MemoryKeyValueStore::default();
        store.set("b", "1").await.unwrap();
        store.set("a", "2").await.unwrap();

        assert_eq!(store.keys().await.unwrap(), vec!["a", "b"]);
    }
}
