//! Port definition for durable string key/value storage.

use async_trait::async_trait;

use crate::domain::errors::StorageError;

/// Durable string storage with a byte quota, modelled after browser storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStorePort: Send + Sync {
    /// Reads a value.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes a value.
    ///
    /// Returns [`StorageError::QuotaExceeded`] when the write would not fit.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes a value. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Lists every stored key.
    async fn keys(&self) -> Result<Vec<String>, StorageError>;
}
