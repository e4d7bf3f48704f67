//! Response DTOs for Web API.

use serde::Serialize;
use utoipa::ToSchema;

use crate::file::{format_timestamp, FileRecord};

/// URL prefix under which stored binaries are served.
pub const UPLOADS_PREFIX: &str = "/uploads";

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// File metadata response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FileResponse {
    /// File ID.
    pub id: i64,
    /// Filename as uploaded.
    pub original_name: String,
    /// Key of the stored binary.
    pub storage_key: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Upload time (RFC 3339, UTC).
    pub uploaded_at: String,
    /// Path the PDF can be viewed at.
    pub url: String,
}

impl From<FileRecord> for FileResponse {
    fn from(record: FileRecord) -> Self {
        Self {
            id: record.id,
            url: binary_url(&record.storage_key),
            uploaded_at: format_timestamp(&record.uploaded_at),
            original_name: record.original_name,
            storage_key: record.storage_key,
            size_bytes: record.size_bytes,
        }
    }
}

/// Path a stored binary is served at.
pub fn binary_url(storage_key: &str) -> String {
    format!("{UPLOADS_PREFIX}/{storage_key}")
}

/// File upload response.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileUploadResponse {
    /// Result message.
    pub message: String,
    /// Uploaded file.
    pub file: FileResponse,
}

/// Plain acknowledgment response.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    /// Result message.
    pub message: String,
}

impl MessageResponse {
    /// Create a new message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_api_response_serialization() {
        let response = ApiResponse::new(MessageResponse::new("File deleted successfully"));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["data"]["message"], "File deleted successfully");
    }

    #[test]
    fn test_file_response_from_record() {
        let record = FileRecord {
            id: 3,
            original_name: "report.pdf".to_string(),
            storage_key: "1700000000000-abc-report.pdf".to_string(),
            size_bytes: 1024,
            uploaded_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        };

        let response = FileResponse::from(record);

        assert_eq!(response.id, 3);
        assert_eq!(response.original_name, "report.pdf");
        assert_eq!(response.size_bytes, 1024);
        assert_eq!(response.uploaded_at, "2023-11-14T22:13:20.000000Z");
        assert_eq!(response.url, "/uploads/1700000000000-abc-report.pdf");
    }

    #[test]
    fn test_file_upload_response_shape() {
        let record = FileRecord {
            id: 1,
            original_name: "a.pdf".to_string(),
            storage_key: "k.pdf".to_string(),
            size_bytes: 9,
            uploaded_at: Utc.timestamp_opt(0, 0).unwrap(),
        };
        let response = ApiResponse::new(FileUploadResponse {
            message: "File uploaded successfully".to_string(),
            file: record.into(),
        });

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["data"]["message"], "File uploaded successfully");
        assert_eq!(json["data"]["file"]["id"], 1);
        assert_eq!(json["data"]["file"]["url"], "/uploads/k.pdf");
    }
}
