//! Domain layer with core entities, error taxonomy and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;
/// Pure domain services.
pub mod services;

pub use entities::{CacheEntry, ResolvedAvatar, Username};
pub use errors::{ProbeFailure, ProxyError, ResolveError, StorageError};
pub use ports::{AvatarCachePort, ClockPort, ProbePort};
