//! Avatar URL caches: server-side in-memory and client-side persisted.

mod memory_cache;
mod persistent_cache;

pub use memory_cache::{CacheStats, DEFAULT_CACHE_CAPACITY, MemoryAvatarCache};
pub use persistent_cache::{ClientCacheStats, KEY_PREFIX, PersistentAvatarCache, format_bytes};
