//! API error handling for the pdfshelf HTTP API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::ShelfError;

/// API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bad request (400).
    BadRequest,
    /// Not found (404).
    NotFound,
    /// Internal server error (500).
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Error details.
    pub error: ErrorDetail,
}

/// Error detail.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Create an internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<ShelfError> for ApiError {
    fn from(err: ShelfError) -> Self {
        if err.is_client_error() {
            tracing::debug!(error = %err, "Upload rejected");
            return ApiError::bad_request(client_error_message(&err));
        }

        let retryable = err.is_retryable();
        match &err {
            ShelfError::NotFound(_) => ApiError::not_found("File not found"),
            ShelfError::StorageWrite(_) | ShelfError::MetadataWrite(_) => {
                tracing::error!(error = %err, retryable, "Upload failed");
                ApiError::internal("Failed to upload file")
            }
            ShelfError::StorageDelete(_) | ShelfError::MetadataDelete(_) => {
                tracing::error!(error = %err, retryable, "Delete failed");
                ApiError::internal("Failed to delete file")
            }
            _ => {
                tracing::error!(error = %err, retryable, "Internal error");
                ApiError::internal("An internal error occurred")
            }
        }
    }
}

/// Message shown to the client for a rejected upload.
fn client_error_message(err: &ShelfError) -> String {
    match err {
        ShelfError::FileTooLarge { max, .. } => {
            format!("File too large (max {}MB)", max / 1024 / 1024)
        }
        ShelfError::MissingFile => "No file uploaded".to_string(),
        _ => "Only PDF files are allowed".to_string(),
    }
}
