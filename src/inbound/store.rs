//! Key-value stores shared between execution contexts.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use super::STORAGE_KEY;
use crate::correlation::WebhookResponse;

/// Errors from a [`SharedStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing storage failed.
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The key contains characters the store cannot represent.
    #[error("Invalid store key '{0}': only ASCII letters, digits, '-' and '_' are allowed")]
    InvalidKey(String),

    /// The value could not be encoded.
    #[error("Failed to encode store value: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A key-value store visible to several execution contexts.
///
/// `take` is consume-once: a value written by `put` is returned by exactly
/// one `take`, after which the key is empty.
pub trait SharedStore: Send + Sync {
    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the value cannot be stored.
    fn put(
        &self,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Removes and returns the value under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn take(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, StoreError>> + Send;
}

/// Writes `response` to `store` under [`STORAGE_KEY`] as JSON.
///
/// # Errors
///
/// Returns [`StoreError`] if encoding or storing fails.
pub async fn publish_to_store<S: SharedStore>(
    store: &S,
    response: &WebhookResponse,
) -> Result<(), StoreError> {
    let value = serde_json::to_string(response)?;
    store.put(STORAGE_KEY, &value).await
}

/// In-process store, for contexts that share memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a value is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}

impl SharedStore for MemoryStore {
    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key))
    }
}

static CLAIM_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Store keeping one file per key in a directory.
///
/// Several processes may share the directory.
///
/// # Atomicity
///
/// - `put` writes `{key}.json.tmp` and renames it to `{key}.json`, so readers
///   never see a partial value.
/// - `take` first renames `{key}.json` to a name unique to the caller, so when
///   several readers race for one value exactly one of them gets it.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    dir: PathBuf,
}

impl DirectoryStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the values.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn value_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    fn put_blocking(dir: &Path, path: &Path, value: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(dir)?;

        let temp_path = PathBuf::from(format!("{}.tmp", path.display()));
        std::fs::write(&temp_path, value)?;
        std::fs::rename(&temp_path, path)?;
        Ok(())
    }

    fn take_blocking(path: &Path) -> Result<Option<String>, StoreError> {
        let claim = PathBuf::from(format!(
            "{}.{}-{}.claimed",
            path.display(),
            std::process::id(),
            CLAIM_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        match std::fs::rename(path, &claim) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let value = std::fs::read_to_string(&claim);
        if let Err(e) = std::fs::remove_file(&claim) {
            tracing::warn!("Failed to remove consumed value {}: {e}", claim.display());
        }
        Ok(Some(value?))
    }
}

impl SharedStore for DirectoryStore {
    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.value_path(key)?;
        let dir = self.dir.clone();
        let value = value.to_string();

        tokio::task::spawn_blocking(move || Self::put_blocking(&dir, &path, &value))
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
    }

    async fn take(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.value_path(key)?;

        tokio::task::spawn_blocking(move || Self::take_blocking(&path))
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
    }
}
