//! Infrastructure layer with external service adapters.

/// Client adapters for the resolution entry point.
pub mod api;
/// Server and client avatar caches.
pub mod cache;
/// System clock.
pub mod clock;
/// Application configuration.
pub mod config;
/// Upstream probes and their catalog.
pub mod probes;
/// Image proxy.
pub mod proxy;
/// Key/value stores backing the client cache.
pub mod storage;

#[cfg(test)]
mod test_server;

pub use api::HttpProfileApi;
pub use cache::{MemoryAvatarCache, PersistentAvatarCache};
pub use clock::SystemClock;
pub use config::{AppConfig, CliArgs, ConfigLoader, LogLevel};
pub use probes::{UpstreamFetcher, default_registry};
pub use proxy::HttpImageProxy;
pub use storage::{FileKeyValueStore, MemoryKeyValueStore};
