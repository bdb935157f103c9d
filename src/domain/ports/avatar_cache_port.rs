//! Port definition for avatar URL caches.

use async_trait::async_trait;

use crate::domain::entities::Username;

/// Username → raw upstream URL cache with a fixed expiry.
///
/// Expired entries are reported as misses and dropped on access.
#[async_trait]
pub trait AvatarCachePort: Send + Sync {
    /// Returns the cached raw URL, or `None` on a miss or expiry.
    async fn get(&self, username: &Username) -> Option<String>;

    /// Stores a raw upstream URL. Returns `false` if the write was dropped.
    async fn put(&self, username: &Username, url: &str) -> bool;

    /// Removes one entry.
    async fn remove(&self, username: &Username);

    /// Removes every entry and returns how many were dropped.
    async fn clear(&self) -> usize;
}
