//! File-backed key/value store for the client result cache.
//!
//! One file per key, named after the hex-encoded key. Sizes are tracked in
//! memory so the quota check does not rescan the directory.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use crate::domain::errors::StorageError;
use crate::domain::ports::KeyValueStorePort;
use crate::infrastructure::config::project_dirs;

/// Default storage quota, in line with typical browser storage limits.
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

const ENTRY_EXTENSION: &str = "json";
const STAGING_EXTENSION: &str = "tmp";

/// Persistent string store rooted in a directory.
#[derive(Debug)]
pub struct FileKeyValueStore {
    dir: PathBuf,
    quota: u64,
    used: AtomicU64,
    entries: AtomicUsize,
    /// Held across a write and its accounting so the quota sees one change at a time.
    writes: Mutex<()>,
    staged: AtomicU64,
}

impl FileKeyValueStore {
    /// Opens (and creates if needed) a store in `dir`.
    ///
    /// # Errors
    /// Returns error if the directory cannot be created or read.
    pub async fn new(dir: PathBuf, quota: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::Io(format!("Failed to create store dir: {e}")))?;

        let mut used = 0u64;
        let mut count = 0usize;

        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| StorageError::Io(format!("Failed to read store dir: {e}")))?;

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if let Some(key) = key_from_path(&path)
                && let Ok(meta) = entry.metadata().await
            {
                used += entry_size(&key, meta.len());
                count += 1;
            }
        }

        debug!(dir = %dir.display(), used, count, "Opened key/value store");

        Ok(Self {
            dir,
            quota,
            used: AtomicU64::new(used),
            entries: AtomicUsize::new(count),
            writes: Mutex::new(()),
            staged: AtomicU64::new(0),
        })
    }

    /// Opens a store in the default location (`~/.cache/oxigram/avatars/`).
    ///
    /// # Errors
    /// Returns error if the directory cannot be created.
    pub async fn default_location(quota: u64) -> Result<Self, StorageError> {
        Self::new(default_dir(), quota).await
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn used_bytes(&self) -> u64 {
        self.used.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{ENTRY_EXTENSION}", hex::encode(key)))
    }

    fn staging_path_for(&self, key: &str) -> PathBuf {
        let seq = self.staged.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!(
            "{}.{}.{seq}.{STAGING_EXTENSION}",
            hex::encode(key),
            std::process::id()
        ))
    }
}

#[async_trait]
impl KeyValueStorePort for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(value) => {
                trace!(key, "Store hit");
                Ok(Some(value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _write = self.writes.lock().await;
        let path = self.path_for(key);
        let old_size = fs::metadata(&path)
            .await
            .ok()
            .map(|m| entry_size(key, m.len()));
        let new_size = entry_size(key, value.len() as u64);

        let needed = self
            .used_bytes()
            .saturating_sub(old_size.unwrap_or(0))
            + new_size;
        if needed > self.quota {
            return Err(StorageError::QuotaExceeded {
                needed,
                quota: self.quota,
            });
        }

        let tmp = self.staging_path_for(key);
        if let Err(e) = write_staged(&tmp, value).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e);
        }
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        match old_size {
            Some(old) if new_size >= old => {
                self.used.fetch_add(new_size - old, Ordering::Relaxed);
            }
            Some(old) => {
                self.used.fetch_sub(old - new_size, Ordering::Relaxed);
            }
            None => {
                self.used.fetch_add(new_size, Ordering::Relaxed);
                self.entries.fetch_add(1, Ordering::Relaxed);
            }
        }

        trace!(key, size = new_size, "Stored entry");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _write = self.writes.lock().await;
        let path = self.path_for(key);
        let size = fs::metadata(&path)
            .await
            .ok()
            .map(|m| entry_size(key, m.len()));

        match fs::remove_file(&path).await {
            Ok(()) => {
                if let Some(size) = size {
                    self.used.fetch_sub(size.min(self.used_bytes()), Ordering::Relaxed);
                    self.entries.fetch_sub(1, Ordering::Relaxed);
                }
                trace!(key, "Removed entry");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(key, error = %e, "Failed to remove entry");
                Err(e.into())
            }
        }
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut keys = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if let Some(key) = key_from_path(&entry.path()) {
                keys.push(key);
            }
        }

        keys.sort();
        Ok(keys)
    }
}

async fn write_staged(tmp: &Path, value: &str) -> Result<(), StorageError> {
    let mut file = fs::File::create(tmp)
        .await
        .map_err(|e| StorageError::Io(format!("Failed to create entry file: {e}")))?;
    file.write_all(value.as_bytes())
        .await
        .map_err(|e| StorageError::Io(format!("Failed to write entry file: {e}")))?;
    file.flush()
        .await
        .map_err(|e| StorageError::Io(format!("Failed to flush entry file: {e}")))?;
    Ok(())
}

fn default_dir() -> PathBuf {
    project_dirs().map_or_else(
        || std::env::temp_dir().join("oxigram").join("avatars"),
        |dirs| dirs.cache_dir().join("avatars"),
    )
}

fn key_from_path(path: &Path) -> Option<String> {
    if path.extension().is_none_or(|ext| ext != ENTRY_EXTENSION) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let bytes = hex::decode(stem).ok()?;
    String::from_utf8(bytes).ok()
}

const fn entry_size(key: &str, value_len: u64) -> u64 {
    key.len() as u64 + value_len
}
