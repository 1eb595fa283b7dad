//! Durable key-value storage for cart snapshots.
//!
//! # Implementations
//!
//! - [`MemoryStore`] - process-local map, lost on exit (tests, ephemeral sessions)
//! - [`FileStore`] - one JSON file per key under a data directory
//!
//! Values are opaque strings; the cart engine owns the serialization format.

use std::collections::HashMap;
use std::future::Future;
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Errors that can occur when reading or writing the durable store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("I/O error for key {key}: {source}")]
    Io {
        /// Key being accessed.
        key: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Key contains characters that are not allowed.
    #[error("Invalid store key: {0:?}")]
    InvalidKey(String),
}

/// A string-keyed slot store that survives process restarts.
pub trait CartStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing storage cannot be read.
    fn read(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the value could not be durably written.
    fn write(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Remove `key` entirely. Succeeds if the key was already absent.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing storage cannot be modified.
    fn erase(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Validate that a key is safe to use as a file name.
fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-memory store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one slot.
    #[must_use]
    pub fn with_slot(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut slots = HashMap::new();
        slots.insert(key.into(), value.into());
        Self {
            slots: RwLock::new(slots),
        }
    }

    /// Whether a value is stored under `key`.
    pub async fn contains(&self, key: &str) -> bool {
        self.slots.read().await.contains_key(key)
    }
}

impl CartStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        Ok(self.slots.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.slots
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn erase(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.slots.write().await.remove(key);
        Ok(())
    }
}

// =============================================================================
// FileStore
// =============================================================================

/// File-backed store: each key is a `<key>.json` file in one directory.
///
/// Each write goes to its own uniquely named temporary file in the same
/// directory, is synced to disk, and is then renamed over the target. A
/// reader never observes a partially written snapshot, and concurrent
/// writers (even from separate processes) never share a temporary file.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the slot files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

fn io_error(key: &str) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        key: key.to_string(),
        source,
    }
}

/// Write `contents` to a fresh temporary file in `dir`, sync it, and rename
/// it over `path`.
fn persist_atomically(dir: &Path, path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl CartStore for FileStore {
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.slot_path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No snapshot on disk");
                Ok(None)
            }
            Err(e) => Err(io_error(key)(e)),
        }
    }

    #[instrument(skip(self, value), fields(dir = %self.dir.display(), bytes = value.len()))]
    async fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.slot_path(key)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(io_error(key))?;

        let dir = self.dir.clone();
        let contents = value.to_owned();
        tokio::task::spawn_blocking(move || persist_atomically(&dir, &path, contents.as_bytes()))
            .await
            .unwrap_or_else(|join| Err(std::io::Error::other(join)))
            .map_err(io_error(key))?;

        debug!("Snapshot written");
        Ok(())
    }

    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn erase(&self, key: &str) -> Result<(), StoreError> {
        let path = self.slot_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key)(e)),
        }
    }
}
