//! Error types for pdfshelf.

use thiserror::Error;

/// Common error type for pdfshelf.
///
/// The lifecycle variants mirror the stage of a pipeline that failed, so a
/// caller can tell a rejected upload from a failed binary write or a failed
/// metadata insert without parsing messages.
#[derive(Error, Debug)]
pub enum ShelfError {
    /// The submitted file is not a PDF (declared or sniffed type).
    #[error("invalid file type: {0}")]
    InvalidFileType(String),

    /// No file was submitted.
    #[error("no file uploaded")]
    MissingFile,

    /// The submitted file exceeds the configured upload limit.
    #[error("file too large: {size} bytes (max {max} bytes)")]
    FileTooLarge {
        /// Submitted size in bytes.
        size: u64,
        /// Configured maximum in bytes.
        max: u64,
    },

    /// Writing a binary object failed.
    #[error("storage write error: {0}")]
    StorageWrite(String),

    /// Reading a binary object failed.
    #[error("storage read error: {0}")]
    StorageRead(String),

    /// Deleting a binary object failed.
    #[error("storage delete error: {0}")]
    StorageDelete(String),

    /// Inserting a metadata record failed.
    #[error("metadata write error: {0}")]
    MetadataWrite(String),

    /// Querying metadata records failed.
    #[error("metadata read error: {0}")]
    MetadataRead(String),

    /// Deleting a metadata record failed.
    #[error("metadata delete error: {0}")]
    MetadataDelete(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Database error outside of the file lifecycle (connection, migration).
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ShelfError {
    /// Whether retrying the same request may succeed.
    ///
    /// Storage I/O failures may be transient. Input errors and `NotFound`
    /// will not change on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ShelfError::StorageWrite(_)
                | ShelfError::StorageRead(_)
                | ShelfError::StorageDelete(_)
                | ShelfError::Io(_)
        )
    }

    /// Whether the error was caused by the client's input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ShelfError::InvalidFileType(_)
                | ShelfError::MissingFile
                | ShelfError::FileTooLarge { .. }
        )
    }
}

impl From<sqlx::Error> for ShelfError {
    fn from(e: sqlx::Error) -> Self {
        ShelfError::Database(e.to_string())
    }
}

/// Result type alias for pdfshelf operations.
pub type Result<T> = std::result::Result<T, ShelfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_file_type_display() {
        let err = ShelfError::InvalidFileType("text/plain".to_string());
        assert_eq!(err.to_string(), "invalid file type: text/plain");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = ShelfError::NotFound("file 42".to_string());
        assert_eq!(err.to_string(), "file 42 not found");
    }

    #[test]
    fn test_file_too_large_display() {
        let err = ShelfError::FileTooLarge { size: 30, max: 20 };
        assert_eq!(err.to_string(), "file too large: 30 bytes (max 20 bytes)");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: ShelfError = io_err.into();
        assert!(matches!(err, ShelfError::Io(_)));
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ShelfError::StorageWrite("disk full".into()).is_retryable());
        assert!(ShelfError::StorageRead("eio".into()).is_retryable());
        assert!(ShelfError::StorageDelete("busy".into()).is_retryable());
        assert!(!ShelfError::InvalidFileType("x".into()).is_retryable());
        assert!(!ShelfError::NotFound("file".into()).is_retryable());
        assert!(!ShelfError::MetadataWrite("constraint".into()).is_retryable());
    }

    #[test]
    fn test_client_error_kinds() {
        assert!(ShelfError::MissingFile.is_client_error());
        assert!(ShelfError::InvalidFileType("x".into()).is_client_error());
        assert!(ShelfError::FileTooLarge { size: 2, max: 1 }.is_client_error());
        assert!(!ShelfError::StorageWrite("x".into()).is_client_error());
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(ShelfError::MissingFile)
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
