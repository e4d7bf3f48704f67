//! File records and the metadata store.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use crate::{Result, ShelfError};

/// Metadata for one uploaded document.
///
/// Records are immutable between creation and deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Unique record ID, assigned on insert and never reused.
    pub id: i64,
    /// Filename as supplied by the client. Not unique.
    pub original_name: String,
    /// Key of the binary object in the binary store.
    pub storage_key: String,
    /// Size of the stored binary in bytes.
    pub size_bytes: u64,
    /// When the upload completed.
    pub uploaded_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for FileRecord {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        let size: i64 = row.try_get("size_bytes")?;
        let uploaded_at: String = row.try_get("uploaded_at")?;

        Ok(Self {
            id: row.try_get("id")?,
            original_name: row.try_get("original_name")?,
            storage_key: row.try_get("storage_key")?,
            size_bytes: u64::try_from(size).map_err(|e| sqlx::Error::ColumnDecode {
                index: "size_bytes".to_string(),
                source: Box::new(e),
            })?,
            uploaded_at: parse_timestamp(&uploaded_at).map_err(|e| sqlx::Error::ColumnDecode {
                index: "uploaded_at".to_string(),
                source: Box::new(e),
            })?,
        })
    }
}

/// Data for creating a new file record.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    /// Filename as supplied by the client.
    pub original_name: String,
    /// Key of the already-written binary.
    pub storage_key: String,
    /// Number of bytes actually written.
    pub size_bytes: u64,
    /// Upload timestamp.
    pub uploaded_at: DateTime<Utc>,
}

impl NewFileRecord {
    /// Create a new record stamped with the current time.
    pub fn new(
        original_name: impl Into<String>,
        storage_key: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            storage_key: storage_key.into(),
            size_bytes,
            uploaded_at: Utc::now(),
        }
    }

    /// Set the upload timestamp.
    pub fn with_uploaded_at(mut self, uploaded_at: DateTime<Utc>) -> Self {
        self.uploaded_at = uploaded_at;
        self
    }
}

/// Store of file records, the source of truth for which files exist.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Insert a record and return it with its assigned id.
    ///
    /// Fails with `MetadataWrite`.
    async fn insert(&self, record: &NewFileRecord) -> Result<FileRecord>;

    /// List all records, newest upload first.
    ///
    /// Fails with `MetadataRead`.
    async fn list(&self) -> Result<Vec<FileRecord>>;

    /// Find a record by id.
    async fn find_by_id(&self, id: i64) -> Result<Option<FileRecord>>;

    /// Find the record that owns a storage key.
    async fn find_by_storage_key(&self, storage_key: &str) -> Result<Option<FileRecord>>;

    /// Delete a record by id. Returns `false` if no record was removed.
    ///
    /// Fails with `MetadataDelete`.
    async fn delete_by_id(&self, id: i64) -> Result<bool>;
}

const SELECT_COLUMNS: &str =
    "SELECT id, original_name, storage_key, size_bytes, uploaded_at FROM files";

/// SQLite-backed metadata store.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: SqlitePool,
}

impl FileRepository {
    /// Create a new FileRepository over the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Count all records.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ShelfError::MetadataRead(e.to_string()))?;

        Ok(count)
    }
}

#[async_trait]
impl MetadataStore for FileRepository {
    async fn insert(&self, record: &NewFileRecord) -> Result<FileRecord> {
        let size = i64::try_from(record.size_bytes).map_err(|_| {
            ShelfError::MetadataWrite(format!("size {} out of range", record.size_bytes))
        })?;
        // Stored timestamps carry microsecond precision.
        let uploaded_at = record.uploaded_at.trunc_subsecs(6);

        // Once the INSERT commits the row is live, so the record is built from
        // the input and the assigned id rather than read back.
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO files (original_name, storage_key, size_bytes, uploaded_at)
             VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(&record.original_name)
        .bind(&record.storage_key)
        .bind(size)
        .bind(format_timestamp(&uploaded_at))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ShelfError::MetadataWrite(e.to_string()))?;

        Ok(FileRecord {
            id,
            original_name: record.original_name.clone(),
            storage_key: record.storage_key.clone(),
            size_bytes: record.size_bytes,
            uploaded_at,
        })
    }

    async fn list(&self) -> Result<Vec<FileRecord>> {
        let query = format!("{SELECT_COLUMNS} ORDER BY uploaded_at DESC, id DESC");
        let records = sqlx::query_as::<_, FileRecord>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ShelfError::MetadataRead(e.to_string()))?;

        Ok(records)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<FileRecord>> {
        let query = format!("{SELECT_COLUMNS} WHERE id = ?");
        let record = sqlx::query_as::<_, FileRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ShelfError::MetadataRead(e.to_string()))?;

        Ok(record)
    }

    async fn find_by_storage_key(&self, storage_key: &str) -> Result<Option<FileRecord>> {
        let query = format!("{SELECT_COLUMNS} WHERE storage_key = ?");
        let record = sqlx::query_as::<_, FileRecord>(&query)
            .bind(storage_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ShelfError::MetadataRead(e.to_string()))?;

        Ok(record)
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| ShelfError::MetadataDelete(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

/// Format a timestamp as fixed-width RFC 3339 (microseconds, `Z`), so that
/// string order matches chronological order.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp.
pub fn parse_timestamp(s: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}
