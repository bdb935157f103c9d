//! Domain entity definitions.

mod avatar;
mod cache_entry;
mod username;

pub use avatar::ResolvedAvatar;
pub use cache_entry::{CacheEntry, DEFAULT_TTL};
pub use username::Username;
