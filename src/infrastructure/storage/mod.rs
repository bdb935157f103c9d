//! Durable key/value stores backing the client result cache.

mod file_store;
mod memory_store;

pub use file_store::{DEFAULT_QUOTA_BYTES, FileKeyValueStore};
pub use memory_store::MemoryKeyValueStore;
