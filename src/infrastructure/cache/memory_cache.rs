//! In-memory LRU avatar cache with a fixed TTL.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use lru::LruCache;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::domain::entities::{CacheEntry, DEFAULT_TTL, Username};
use crate::domain::ports::{AvatarCachePort, ClockPort};

/// Default maximum number of usernames kept in memory.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Server-side username → raw URL cache.
///
/// Bounded by `capacity` with least-recently-used eviction. Entries older
/// than the TTL count as misses and are dropped when read.
pub struct MemoryAvatarCache {
    cache: Arc<RwLock<LruCache<Username, CacheEntry>>>,
    ttl: Duration,
    clock: Arc<dyn ClockPort>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryAvatarCache {
    /// Creates a new cache. A zero capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration, clock: Arc<dyn ClockPort>) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Arc::new(RwLock::new(LruCache::new(cap))),
            ttl,
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Creates a cache with the default capacity and a 24h TTL.
    #[must_use]
    pub fn with_defaults(clock: Arc<dyn ClockPort>) -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL, clock)
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns cache statistics.
    #[allow(clippy::cast_precision_loss)]
    pub async fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        CacheStats {
            hits,
            misses,
            hit_rate,
            size: self.cache.read().await.len(),
        }
    }

    /// Drops every expired entry and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut cache = self.cache.write().await;

        let expired: Vec<Username> = cache
            .iter()
            .filter(|(_, entry)| entry.is_expired(now, self.ttl))
            .map(|(username, _)| username.clone())
            .collect();

        for username in &expired {
            cache.pop(username);
        }

        if !expired.is_empty() {
            debug!(removed = expired.len(), "Purged expired avatar entries");
        }
        expired.len()
    }
}

impl std::fmt::Debug for MemoryAvatarCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAvatarCache")
            .field("ttl", &self.ttl)
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish_non_exhaustive()
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses, expired reads included.
    pub misses: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    /// Current number of cached usernames.
    pub size: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {} usernames, {:.1}% hit rate ({} hits, {} misses)",
            self.size, self.hit_rate, self.hits, self.misses
        )
    }
}

#[async_trait]
impl AvatarCachePort for MemoryAvatarCache {
    async fn get(&self, username: &Username) -> Option<String> {
        let now = self.clock.now();
        let mut cache = self.cache.write().await;

        let expired = match cache.get(username) {
            Some(entry) if !entry.is_expired(now, self.ttl) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(username = %username, "Memory cache hit");
                return Some(entry.url.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            cache.pop(username);
            debug!(username = %username, "Dropped expired avatar entry");
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!(username = %username, "Memory cache miss");
        None
    }

    async fn put(&self, username: &Username, url: &str) -> bool {
        let entry = CacheEntry::new(url, self.clock.now());
        let mut cache = self.cache.write().await;
        debug!(username = %username, "Storing avatar in memory cache");
        cache.put(username.clone(), entry);
        true
    }

    async fn remove(&self, username: &Username) {
        let mut cache = self.cache.write().await;
        if cache.pop(username).is_some() {
            debug!(username = %username, "Evicted avatar from memory cache");
        }
    }

    async fn clear(&self) -> usize {
        let mut cache = self.cache.write().await;
        let removed = cache.len();
        cache.clear();
        debug!(removed, "Cleared memory avatar cache");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::ManualClock;

    const URL: &str = "https://cdn.example/a.jpg";

    fn user(name: &str) -> Username {
        Username::parse(name).unwrap()
    }

    fn cache_with_clock(capacity: usize) -> (MemoryAvatarCache, ManualClock) {
        let clock = ManualClock::new();
        let cache = MemoryAvatarCache::new(capacity, DEFAULT_TTL, Arc::new(clock.clone()));
        (cache, clock)
    }

    #[tokio::test]
    async fn test_cache_put_and_get() {
        let (cache, _) = cache_with_clock(10);

        assert!(cache.put(&user("alice"), URL).await);

        assert_eq!(cache.get(&user("alice")).await.as_deref(), Some(URL));
    }

    #[tokio::test]
    async fn test_cache_miss() {
        let (cache, _) = cache_with_clock(10);

        assert!(cache.get(&user("nobody")).await.is_none());
    }

    #[tokio::test]
    async fn test_entry_expires_at_ttl() {
        let (cache, clock) = cache_with_clock(10);
        cache.put(&user("alice"), URL).await;

        clock.advance(DEFAULT_TTL - Duration::from_secs(1));
        assert!(cache.get(&user("alice")).await.is_some());

        clock.advance(Duration::from_secs(1));
        assert!(cache.get(&user("alice")).await.is_none());
        assert_eq!(cache.stats().await.size, 0);
    }

    #[tokio::test]
    async fn test_put_refreshes_timestamp() {
        let (cache, clock) = cache_with_clock(10);
        cache.put(&user("alice"), URL).await;

        clock.advance(Duration::from_secs(20 * 60 * 60));
        cache.put(&user("alice"), "https://cdn.example/b.jpg").await;
        clock.advance(Duration::from_secs(20 * 60 * 60));

        assert_eq!(
            cache.get(&user("alice")).await.as_deref(),
            Some("https://cdn.example/b.jpg")
        );
    }

    #[tokio::test]
    async fn test_cache_eviction() {
        let (cache, _) = cache_with_clock(2);

        cache.put(&user("one"), URL).await;
        cache.put(&user("two"), URL).await;
        cache.put(&user("three"), URL).await;

        // "one" is least recently used
        assert!(cache.get(&user("one")).await.is_none());
        assert!(cache.get(&user("two")).await.is_some());
        assert!(cache.get(&user("three")).await.is_some());
    }

    #[tokio::test]
    async fn test_cache_stats() {
        let (cache, _) = cache_with_clock(10);
        cache.put(&user("alice"), URL).await;

        let _ = cache.get(&user("alice")).await;
        let _ = cache.get(&user("missing")).await;

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert!((stats.hit_rate - 50.0).abs() < f64::EPSILON);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["hitRate"], 50.0);
    }

    #[tokio::test]
    async fn test_purge_and_clear() {
        let (cache, clock) = cache_with_clock(10);
        cache.put(&user("old"), URL).await;
        clock.advance(DEFAULT_TTL);
        cache.put(&user("fresh"), URL).await;

        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.clear().await, 1);
        assert_eq!(cache.stats().await.size, 0);
    }
}
