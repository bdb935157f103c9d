//! Client-side avatar cache persisted through a key/value store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::entities::{CacheEntry, DEFAULT_TTL, Username};
use crate::domain::errors::StorageError;
use crate::domain::ports::{AvatarCachePort, ClockPort, KeyValueStorePort};

/// Prefix of every key owned by this cache.
pub const KEY_PREFIX: &str = "ig_avatar_";

const AVAILABILITY_KEY: &str = "__oxigram_storage_test__";

/// Username → raw URL cache that survives restarts.
///
/// Corrupt or expired entries are removed when read. When the store is full,
/// entries older than half the TTL are dropped and the write is retried once.
#[derive(Clone)]
pub struct PersistentAvatarCache {
    store: Arc<dyn KeyValueStorePort>,
    clock: Arc<dyn ClockPort>,
    ttl: Duration,
}

impl PersistentAvatarCache {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStorePort>, clock: Arc<dyn ClockPort>) -> Self {
        Self::with_ttl(store, clock, DEFAULT_TTL)
    }

    #[must_use]
    pub fn with_ttl(
        store: Arc<dyn KeyValueStorePort>,
        clock: Arc<dyn ClockPort>,
        ttl: Duration,
    ) -> Self {
        Self { store, clock, ttl }
    }

    fn key(username: &Username) -> String {
        format!("{KEY_PREFIX}{username}")
    }

    async fn own_keys(&self) -> Result<Vec<String>, StorageError> {
        let keys = self.store.keys().await?;
        Ok(keys
            .into_iter()
            .filter(|key| key.starts_with(KEY_PREFIX))
            .collect())
    }

    async fn write(&self, key: &str, url: &str) -> Result<(), StorageError> {
        let entry = CacheEntry::new(url, self.clock.now());
        let value = serde_json::to_string(&entry)?;
        self.store.set(key, &value).await
    }

    /// Removes every entry strictly older than `age`; unreadable entries go too.
    ///
    /// # Errors
    /// Returns error if the store cannot be listed.
    pub async fn clear_older_than(&self, age: Duration) -> Result<usize, StorageError> {
        let now = self.clock.now();
        let mut removed = 0;

        for key in self.own_keys().await? {
            let stale = match self.store.get(&key).await {
                Ok(Some(raw)) => serde_json::from_str::<CacheEntry>(&raw)
                    .map_or(true, |entry| entry.age(now) > age),
                Ok(None) => false,
                Err(_) => true,
            };
            if stale && self.store.remove(&key).await.is_ok() {
                removed += 1;
            }
        }

        info!(removed, older_than_secs = age.as_secs(), "Cleared old avatar entries");
        Ok(removed)
    }

    /// Removes every entry owned by this cache.
    ///
    /// # Errors
    /// Returns error if the store cannot be listed.
    pub async fn clear_all(&self) -> Result<usize, StorageError> {
        let keys = self.own_keys().await?;
        let mut removed = 0;
        for key in &keys {
            if self.store.remove(key).await.is_ok() {
                removed += 1;
            }
        }
        info!(removed, "Cleared all avatar entries");
        Ok(removed)
    }

    /// Counts entries by freshness and estimates their footprint.
    ///
    /// # Errors
    /// Returns error if the store cannot be listed.
    pub async fn stats(&self) -> Result<ClientCacheStats, StorageError> {
        let now = self.clock.now();
        let mut stats = ClientCacheStats::default();

        for key in self.own_keys().await? {
            let Ok(Some(raw)) = self.store.get(&key).await else {
                continue;
            };
            stats.total += 1;
            stats.approx_bytes += raw.len() as u64 * 2;
            match serde_json::from_str::<CacheEntry>(&raw) {
                Ok(entry) if !entry.is_expired(now, self.ttl) => stats.valid += 1,
                _ => stats.expired += 1,
            }
        }

        Ok(stats)
    }

    /// Returns whether the backing store accepts a write and a delete.
    pub async fn is_available(&self) -> bool {
        let writable = self
            .store
            .set(AVAILABILITY_KEY, AVAILABILITY_KEY)
            .await
            .is_ok();
        writable && self.store.remove(AVAILABILITY_KEY).await.is_ok()
    }
}

impl std::fmt::Debug for PersistentAvatarCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentAvatarCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AvatarCachePort for PersistentAvatarCache {
    async fn get(&self, username: &Username) -> Option<String> {
        let key = Self::key(username);
        let raw = match self.store.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(username = %username, error = %e, "Failed to read avatar entry");
                return None;
            }
        };

        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) if !entry.is_expired(self.clock.now(), self.ttl) => Some(entry.url),
            Ok(_) => {
                debug!(username = %username, "Avatar entry expired");
                let _ = self.store.remove(&key).await;
                None
            }
            Err(e) => {
                warn!(username = %username, error = %e, "Dropping corrupt avatar entry");
                let _ = self.store.remove(&key).await;
                None
            }
        }
    }

    async fn put(&self, username: &Username, url: &str) -> bool {
        let key = Self::key(username);
        match self.write(&key, url).await {
            Ok(()) => true,
            Err(e) if e.is_quota_exceeded() => {
                warn!(username = %username, "Storage quota exceeded, clearing old entries");
                if let Err(e) = self.clear_older_than(self.ttl / 2).await {
                    warn!(error = %e, "Failed to clear old entries");
                }
                match self.write(&key, url).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(username = %username, error = %e, "Dropped avatar write after clearing");
                        false
                    }
                }
            }
            Err(e) => {
                warn!(username = %username, error = %e, "Failed to store avatar entry");
                false
            }
        }
    }

    async fn remove(&self, username: &Username) {
        if let Err(e) = self.store.remove(&Self::key(username)).await {
            warn!(username = %username, error = %e, "Failed to remove avatar entry");
        }
    }

    async fn clear(&self) -> usize {
        self.clear_all().await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to clear avatar entries");
            0
        })
    }
}

/// Freshness breakdown of the persisted cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClientCacheStats {
    /// Entries owned by the cache.
    pub total: usize,
    /// Entries younger than the TTL.
    pub valid: usize,
    /// Expired or unreadable entries.
    pub expired: usize,
    /// Footprint estimate: two bytes per stored character.
    pub approx_bytes: u64,
}

impl ClientCacheStats {
    /// Human-readable footprint, e.g. `1.5 KB`.
    #[must_use]
    pub fn size(&self) -> String {
        format_bytes(self.approx_bytes)
    }
}

impl std::fmt::Display for ClientCacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} entries ({} valid, {} expired), {}",
            self.total,
            self.valid,
            self.expired,
            self.size()
        )
    }
}

/// Formats a byte count with 1024-based units and at most two decimals.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    let text = format!("{rounded:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::{ManualClock, MockKeyValueStorePort};
    use crate::infrastructure::storage::MemoryKeyValueStore;
    use test_case::test_case;

    const URL: &str = "https://cdn.example/a.jpg";

    fn alice() -> Username {
        Username::parse("alice").unwrap()
    }

    fn cache_over(store: Arc<dyn KeyValueStorePort>) -> (PersistentAvatarCache, ManualClock) {
        let clock = ManualClock::new();
        let cache = PersistentAvatarCache::new(store, Arc::new(clock.clone()));
        (cache, clock)
    }

    #[tokio::test]
    async fn test_put_writes_prefixed_json_entry() {
        let store = Arc::new(MemoryKeyValueStore::default());
        let (cache, _) = cache_over(Arc::clone(&store) as Arc<dyn KeyValueStorePort>);

        assert!(cache.put(&alice(), URL).await);

        let raw = store.get("ig_avatar_alice").await.unwrap().unwrap();
        assert_eq!(
            raw,
            r#"{"url":"https://cdn.example/a.jpg","timestamp":1735689600000}"#
        );
        assert_eq!(cache.get(&alice()).await.as_deref(), Some(URL));
    }

    #[tokio::test]
    async fn test_expired_entry_is_removed_on_read() {
        let store = Arc::new(MemoryKeyValueStore::default());
        let (cache, clock) = cache_over(Arc::clone(&store) as Arc<dyn KeyValueStorePort>);
        cache.put(&alice(), URL).await;

        clock.advance(DEFAULT_TTL);

        assert_eq!(cache.get(&alice()).await, None);
        assert_eq!(store.get("ig_avatar_alice").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss_and_removed() {
        let store = Arc::new(MemoryKeyValueStore::default());
        store.set("ig_avatar_alice", "not json").await.unwrap();
        let (cache, _) = cache_over(Arc::clone(&store) as Arc<dyn KeyValueStorePort>);

        assert_eq!(cache.get(&alice()).await, None);
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quota_exceeded_clears_old_entries_and_retries() {
        // Room for exactly one entry.
        let store = Arc::new(MemoryKeyValueStore::new(80));
        let (cache, clock) = cache_over(Arc::clone(&store) as Arc<dyn KeyValueStorePort>);

        assert!(cache.put(&Username::parse("old").unwrap(), URL).await);
        clock.advance(Duration::from_secs(13 * 60 * 60));

        assert!(cache.put(&Username::parse("new").unwrap(), URL).await);
        assert_eq!(store.keys().await.unwrap(), vec!["ig_avatar_new"]);
    }

    #[tokio::test]
    async fn test_quota_exceeded_with_fresh_entries_drops_write() {
        let store = Arc::new(MemoryKeyValueStore::new(80));
        let (cache, _) = cache_over(Arc::clone(&store) as Arc<dyn KeyValueStorePort>);

        assert!(cache.put(&Username::parse("old").unwrap(), URL).await);
        assert!(!cache.put(&Username::parse("new").unwrap(), URL).await);
        assert_eq!(store.keys().await.unwrap(), vec!["ig_avatar_old"]);
    }

    #[tokio::test]
    async fn test_other_keys_are_left_alone() {
        let store = Arc::new(MemoryKeyValueStore::default());
        store.set("unrelated", "keep me").await.unwrap();
        let (cache, _) = cache_over(Arc::clone(&store) as Arc<dyn KeyValueStorePort>);
        cache.put(&alice(), URL).await;
        cache.put(&Username::parse("bob").unwrap(), URL).await;

        assert_eq!(cache.clear_all().await.unwrap(), 2);
        assert_eq!(store.keys().await.unwrap(), vec!["unrelated"]);
    }

    #[tokio::test]
    async fn test_clear_older_than_is_strict() {
        let store = Arc::new(MemoryKeyValueStore::default());
        let (cache, clock) = cache_over(Arc::clone(&store) as Arc<dyn KeyValueStorePort>);
        cache.put(&alice(), URL).await;
        clock.advance(Duration::from_secs(60));
        cache.put(&Username::parse("bob").unwrap(), URL).await;

        assert_eq!(cache.clear_older_than(Duration::from_secs(60)).await.unwrap(), 0);
        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.clear_older_than(Duration::from_secs(60)).await.unwrap(), 1);
        assert_eq!(cache.get(&Username::parse("bob").unwrap()).await.as_deref(), Some(URL));
    }

    #[tokio::test]
    async fn test_stats_counts_valid_and_expired() {
        let store = Arc::new(MemoryKeyValueStore::default());
        let (cache, clock) = cache_over(Arc::clone(&store) as Arc<dyn KeyValueStorePort>);
        cache.put(&alice(), URL).await;
        clock.advance(DEFAULT_TTL);
        cache.put(&Username::parse("bob").unwrap(), URL).await;
        store.set("ig_avatar_broken", "{").await.unwrap();

        let stats = cache.stats().await.unwrap();

        assert_eq!(stats.total, 3);
        assert_eq!(stats.valid, 1);
        assert_eq!(stats.expired, 2);
        let entry_len = r#"{"url":"https://cdn.example/a.jpg","timestamp":1735689600000}"#.len() as u64;
        assert_eq!(stats.approx_bytes, (entry_len * 2 + 1) * 2);
    }

    #[tokio::test]
    async fn test_is_available_reports_store_failure() {
        let mut store = MockKeyValueStorePort::new();
        store
            .expect_set()
            .returning(|_, _| Err(StorageError::Io("read-only".to_string())));
        let (cache, _) = cache_over(Arc::new(store));

        assert!(!cache.is_available().await);
    }

    #[tokio::test]
    async fn test_is_available_leaves_no_sentinel() {
        let store = Arc::new(MemoryKeyValueStore::default());
        let (cache, _) = cache_over(Arc::clone(&store) as Arc<dyn KeyValueStorePort>);

        assert!(cache.is_available().await);
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[test_case(0, "0 Bytes" ; "zero")]
    #[test_case(500, "500 Bytes" ; "bytes")]
    #[test_case(1024, "1 KB" ; "one_kib")]
    #[test_case(1536, "1.5 KB" ; "fractional_kib")]
    #[test_case(1_048_576, "1 MB" ; "one_mib")]
    #[test_case(5 * 1024 * 1024 + 123_456, "5.12 MB" ; "rounded_mib")]
    fn test_format_bytes(bytes: u64, expected: &str) {
        assert_eq!(format_bytes(bytes), expected);
    }
}
