//! Binary storage for uploaded documents.
//!
//! Objects live in a flat directory, one file per storage key:
//! ```text
//! {base_path}/
//! ├── 1718000000000-3f2a...-report.pdf
//! ├── 1718000004211-9c01...-report.pdf
//! └── ...
//! ```
//! Writes land in a `*.part` sibling first and are renamed into place once
//! synced, so an interrupted write never leaves a truncated object under a
//! live key.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

use crate::{Result, ShelfError};

/// Longest sanitized name fragment embedded in a storage key.
const MAX_KEY_NAME_LENGTH: usize = 64;

/// Maximum length of a storage key in bytes.
const MAX_KEY_LENGTH: usize = 255;

/// Suffix of in-flight writes.
const PARTIAL_SUFFIX: &str = ".part";

/// Content store addressed by storage key.
///
/// Implementations must be safe to call concurrently for different keys.
/// Each call may suspend on I/O; callers must not hold locks across them.
#[async_trait]
pub trait BinaryStore: Send + Sync {
    /// Write `content` under `key`, returning the number of bytes persisted.
    async fn write(&self, key: &str, content: &[u8]) -> Result<u64>;

    /// Read the object stored under `key`.
    ///
    /// Fails with `NotFound` when no object exists.
    async fn read(&self, key: &str) -> Result<Vec<u8>>;

    /// Delete the object stored under `key`.
    ///
    /// Returns `false` if there was nothing to delete.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Check whether an object exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// List every name currently held by the store, including leftovers of
    /// interrupted writes.
    async fn list_keys(&self) -> Result<Vec<String>>;
}

/// Filesystem-backed binary store.
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Base directory for stored objects.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new FileStorage with the given base path.
    ///
    /// The base directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve a key to its path, rejecting anything that could escape the
    /// base directory.
    fn object_path(&self, key: &str) -> Option<PathBuf> {
        is_valid_key(key).then(|| self.base_path.join(key))
    }
}

#[async_trait]
impl BinaryStore for FileStorage {
    async fn write(&self, key: &str, content: &[u8]) -> Result<u64> {
        let path = self
            .object_path(key)
            .ok_or_else(|| ShelfError::StorageWrite(format!("invalid storage key: {key}")))?;
        let temp_path = self
            .base_path
            .join(format!("{key}.{}{PARTIAL_SUFFIX}", Uuid::new_v4().simple()));

        let result = write_synced(&temp_path, content).await;
        let written = match result {
            Ok(written) => written,
            Err(e) => {
                let _ = fs::remove_file(&temp_path).await;
                return Err(ShelfError::StorageWrite(format!("{key}: {e}")));
            }
        };

        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(ShelfError::StorageWrite(format!("{key}: {e}")));
        }

        debug!(storage_key = %key, size_bytes = written, "Binary written");
        Ok(written)
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let Some(path) = self.object_path(key) else {
            return Err(ShelfError::NotFound(format!("binary {key}")));
        };

        match fs::read(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(ShelfError::NotFound(format!("binary {key}")))
            }
            Err(e) => Err(ShelfError::StorageRead(format!("{key}: {e}"))),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let Some(path) = self.object_path(key) else {
            return Ok(false);
        };

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ShelfError::StorageDelete(format!("{key}: {e}"))),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let Some(path) = self.object_path(key) else {
            return Ok(false);
        };

        fs::try_exists(&path)
            .await
            .map_err(|e| ShelfError::StorageRead(format!("{key}: {e}")))
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let mut entries = fs::read_dir(&self.base_path)
            .await
            .map_err(|e| ShelfError::StorageRead(format!("{}: {e}", self.base_path.display())))?;

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ShelfError::StorageRead(e.to_string()))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                keys.push(name.to_string());
            }
        }

        keys.sort();
        Ok(keys)
    }
}

/// Write and fsync a file, returning its length on disk.
async fn write_synced(path: &Path, content: &[u8]) -> io::Result<u64> {
    let mut file = fs::File::create(path).await?;
    file.write_all(content).await?;
    file.sync_all().await?;
    Ok(file.metadata().await?.len())
}

/// Whether `key` names a partially written object.
pub fn is_partial_key(key: &str) -> bool {
    key.ends_with(PARTIAL_SUFFIX)
}

/// Check that a key is a single, plain path component.
///
/// Only ASCII alphanumerics, `.`, `-` and `_` are allowed, and the key may
/// not start with a dot, which rules out `.` and `..`.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_KEY_LENGTH
        && !key.starts_with('.')
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_'))
}

/// Generate a new storage key for an upload.
///
/// Format: `{unix_millis}-{uuid}-{sanitized_name}.pdf`. The timestamp and
/// name keep keys readable on disk; the random UUID is what makes keys
/// unique across concurrent uploads of identically named files.
pub fn generate_storage_key(original_name: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}-{}-{}.pdf",
        now.timestamp_millis(),
        Uuid::new_v4().simple(),
        key_name_fragment(original_name)
    )
}

/// Reduce an original filename to a safe key fragment (extension removed).
fn key_name_fragment(original_name: &str) -> String {
    let stem = Path::new(original_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    let fragment: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_KEY_NAME_LENGTH)
        .collect();

    if fragment.chars().all(|c| c == '_') {
        "document".to_string()
    } else {
        fragment
    }
}
