//! File lifecycle pipelines.
//!
//! Binary and metadata storage are independent services with no shared
//! transaction, so every operation here is an explicit sequence of steps:
//!
//! - upload: validate → write binary → insert record. A failed insert is
//!   compensated by deleting the binary it would have referenced.
//! - delete: find record → delete binary (absence tolerated) → delete record.
//! - list and read never mutate state.
//!
//! The metadata store decides whether a file exists. A binary without a
//! record is an orphan; [`FileService::sweep_orphans`] removes those.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::metadata::{FileRecord, MetadataStore, NewFileRecord};
use super::storage::{generate_storage_key, is_partial_key, BinaryStore};
use super::validation::{clean_original_name, ensure_pdf};
use crate::{Result, ShelfError};

/// A file submitted for upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Raw file content.
    pub content: Vec<u8>,
    /// Client-supplied filename.
    pub original_name: String,
    /// Client-declared MIME type, if any.
    pub declared_mime: Option<String>,
}

impl UploadRequest {
    /// Create a new upload request.
    pub fn new(content: impl Into<Vec<u8>>, original_name: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            original_name: original_name.into(),
            declared_mime: None,
        }
    }

    /// Set the declared MIME type.
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.declared_mime = Some(mime.into());
        self
    }
}

/// Lifecycle service over a binary store and a metadata store.
///
/// Cheap to clone; clones share the same stores.
#[derive(Clone)]
pub struct FileService {
    binaries: Arc<dyn BinaryStore>,
    metadata: Arc<dyn MetadataStore>,
    max_upload_bytes: u64,
}

impl FileService {
    /// Create a new service.
    pub fn new(
        binaries: Arc<dyn BinaryStore>,
        metadata: Arc<dyn MetadataStore>,
        max_upload_bytes: u64,
    ) -> Self {
        Self {
            binaries,
            metadata,
            max_upload_bytes,
        }
    }

    /// Maximum accepted upload size in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Upload a PDF.
    ///
    /// Nothing is written unless the submission passes validation. On
    /// success exactly one binary and one record exist for the new file.
    pub async fn upload(&self, request: UploadRequest) -> Result<FileRecord> {
        let original_name =
            clean_original_name(&request.original_name).ok_or(ShelfError::MissingFile)?;

        let size = request.content.len() as u64;
        if size > self.max_upload_bytes {
            return Err(ShelfError::FileTooLarge {
                size,
                max: self.max_upload_bytes,
            });
        }

        ensure_pdf(
            &request.content,
            &original_name,
            request.declared_mime.as_deref(),
        )?;

        let now = Utc::now();
        let storage_key = generate_storage_key(&original_name, now);

        let written = self.binaries.write(&storage_key, &request.content).await?;

        let new_record =
            NewFileRecord::new(&original_name, &storage_key, written).with_uploaded_at(now);
        let record = match self.metadata.insert(&new_record).await {
            Ok(record) => record,
            Err(e) => {
                self.compensate_upload(&storage_key).await;
                return Err(match e {
                    ShelfError::MetadataWrite(_) => e,
                    other => ShelfError::MetadataWrite(other.to_string()),
                });
            }
        };

        info!(
            id = record.id,
            storage_key = %record.storage_key,
            size_bytes = record.size_bytes,
            original_name = %record.original_name,
            "File uploaded"
        );
        Ok(record)
    }

    /// Remove the binary of an upload whose record could not be inserted.
    ///
    /// Attempted once. A failure leaves an orphaned binary, which is logged
    /// and left for the orphan sweep.
    async fn compensate_upload(&self, storage_key: &str) {
        match self.binaries.delete(storage_key).await {
            Ok(_) => debug!(storage_key = %storage_key, "Rolled back binary of failed upload"),
            Err(e) => warn!(
                storage_key = %storage_key,
                error = %e,
                "Failed to roll back binary of failed upload; orphan left behind"
            ),
        }
    }

    /// List all files, newest first.
    pub async fn list_files(&self) -> Result<Vec<FileRecord>> {
        self.metadata.list().await
    }

    /// Get a single file record.
    pub async fn get_file(&self, id: i64) -> Result<FileRecord> {
        self.metadata
            .find_by_id(id)
            .await?
            .ok_or_else(|| ShelfError::NotFound(format!("file {id}")))
    }

    /// Delete a file and its binary.
    ///
    /// Returns the removed record. A second call for the same id fails with
    /// `NotFound`.
    pub async fn delete_file(&self, id: i64) -> Result<FileRecord> {
        let record = self.get_file(id).await?;

        if !self.binaries.delete(&record.storage_key).await? {
            debug!(
                id,
                storage_key = %record.storage_key,
                "Binary already absent, continuing with record removal"
            );
        }

        if !self.metadata.delete_by_id(id).await? {
            // A concurrent delete removed the record first.
            return Err(ShelfError::NotFound(format!("file {id}")));
        }

        info!(
            id,
            storage_key = %record.storage_key,
            original_name = %record.original_name,
            "File deleted"
        );
        Ok(record)
    }

    /// Read the binary of a live file by storage key.
    ///
    /// Only keys owned by an existing record are served, so an orphaned
    /// binary is never exposed.
    pub async fn read_binary(&self, storage_key: &str) -> Result<(FileRecord, Vec<u8>)> {
        let record = self
            .metadata
            .find_by_storage_key(storage_key)
            .await?
            .ok_or_else(|| ShelfError::NotFound(format!("binary {storage_key}")))?;

        let content = self.binaries.read(storage_key).await?;
        Ok((record, content))
    }

    /// Remove binaries that no record references, including leftovers of
    /// interrupted writes.
    ///
    /// Must not run concurrently with uploads: a binary written but not yet
    /// recorded looks exactly like an orphan.
    pub async fn sweep_orphans(&self) -> Result<usize> {
        let live: HashSet<String> = self
            .metadata
            .list()
            .await?
            .into_iter()
            .map(|r| r.storage_key)
            .collect();

        let mut removed = 0;
        for key in self.binaries.list_keys().await? {
            if live.contains(&key) {
                continue;
            }
            match self.binaries.delete(&key).await {
                Ok(true) => {
                    removed += 1;
                    info!(
                        storage_key = %key,
                        partial = is_partial_key(&key),
                        "Removed orphaned binary"
                    );
                }
                Ok(false) => {}
                Err(e) => warn!(storage_key = %key, error = %e, "Failed to remove orphaned binary"),
            }
        }

        Ok(removed)
    }
}

impl std::fmt::Debug for FileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileService")
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}
