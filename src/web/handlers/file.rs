//! File handlers for Web API.

use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::file::{UploadRequest, PDF_MIME_TYPE};
use crate::web::dto::{ApiResponse, FileResponse, FileUploadResponse, MessageResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::ShelfError;

/// Multipart field names accepted for the uploaded file.
const UPLOAD_FIELDS: &[&str] = &["pdf", "file"];

/// Generate a safe inline Content-Disposition header value for viewing.
///
/// Control characters are removed so the filename cannot inject headers.
/// Non-ASCII names additionally get an RFC 5987 `filename*` parameter.
fn content_disposition_header(filename: &str) -> String {
    // ASCII fallback for the basic filename parameter
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            c if !c.is_ascii() => '_',
            _ => c,
        })
        .collect();

    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("inline; filename=\"{}\"", filename);
    }

    let cleaned: String = filename.chars().filter(|c| !c.is_control()).collect();
    let encoded = urlencoding::encode(&cleaned);

    format!(
        "inline; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    )
}

/// Map a multipart read failure, keeping the body-limit case recognizable.
fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!("Upload rejected by body limit: {}", e);
        return ApiError::bad_request("File too large");
    }
    tracing::warn!("Failed to read multipart data: {}", e);
    ApiError::bad_request("Invalid multipart data")
}

/// Run a lifecycle operation to completion even if the client disconnects.
async fn run_detached<T, F>(operation: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: std::future::Future<Output = crate::Result<T>> + Send + 'static,
{
    tokio::spawn(operation)
        .await
        .map_err(|e| {
            tracing::error!("File operation task failed: {}", e);
            ApiError::internal("An internal error occurred")
        })?
        .map_err(ApiError::from)
}

/// POST /api/upload - Upload a PDF.
///
/// Request body: multipart/form-data with a `pdf` field (`file` is accepted too).
#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "files",
    request_body(
        content = Vec<u8>,
        content_type = "multipart/form-data",
        description = "PDF in the `pdf` field"
    ),
    responses(
        (status = 200, description = "File uploaded, wrapped in `data`", body = FileUploadResponse),
        (status = 400, description = "Missing file, not a PDF, or file too large"),
        (status = 500, description = "Storage or metadata failure")
    )
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<FileUploadResponse>>, ApiError> {
    let mut upload: Option<UploadRequest> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        if upload.is_some() || !UPLOAD_FIELDS.contains(&name.as_str()) {
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_string();
        let declared_mime = field.content_type().map(|s| s.to_string());
        let content = field.bytes().await.map_err(multipart_error)?;

        let mut request = UploadRequest::new(content.to_vec(), filename);
        if let Some(mime) = declared_mime {
            request = request.with_mime(mime);
        }
        upload = Some(request);
    }

    let request = upload.ok_or(ShelfError::MissingFile)?;

    let files = state.files.clone();
    let record = run_detached(async move { files.upload(request).await }).await?;

    let response = FileUploadResponse {
        message: "File uploaded successfully".to_string(),
        file: FileResponse::from(record),
    };

    Ok(Json(ApiResponse::new(response)))
}

/// GET /api/pdfs - List all uploaded PDFs, newest first.
#[utoipa::path(
    get,
    path = "/api/pdfs",
    tag = "files",
    responses(
        (
            status = 200,
            description = "Files, newest first, wrapped in `data`",
            body = Vec<FileResponse>
        ),
        (status = 500, description = "Metadata store failure")
    )
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<FileResponse>>>, ApiError> {
    let records = state.files.list_files().await?;
    let responses = records.into_iter().map(FileResponse::from).collect();

    Ok(Json(ApiResponse::new(responses)))
}

/// GET /api/pdf/:id - Get file metadata.
#[utoipa::path(
    get,
    path = "/api/pdf/{id}",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File metadata, wrapped in `data`", body = FileResponse),
        (status = 404, description = "File not found")
    )
)]
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<i64>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let record = state.files.get_file(file_id).await?;

    Ok(Json(ApiResponse::new(FileResponse::from(record))))
}

/// DELETE /api/pdf/:id - Delete a PDF and its metadata.
#[utoipa::path(
    delete,
    path = "/api/pdf/{id}",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File deleted, wrapped in `data`", body = MessageResponse),
        (status = 404, description = "File not found"),
        (status = 500, description = "Storage or metadata failure")
    )
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<i64>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let files = state.files.clone();
    run_detached(async move { files.delete_file(file_id).await }).await?;

    Ok(Json(ApiResponse::new(MessageResponse::new(
        "File deleted successfully",
    ))))
}

/// GET /uploads/:storage_key - View a stored PDF.
#[utoipa::path(
    get,
    path = "/uploads/{storage_key}",
    tag = "files",
    params(
        ("storage_key" = String, Path, description = "Storage key from the file metadata")
    ),
    responses(
        (status = 200, description = "PDF content", content_type = "application/pdf"),
        (status = 404, description = "File not found")
    )
)]
pub async fn view_file(
    State(state): State<Arc<AppState>>,
    Path(storage_key): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let (record, content) = state.files.read_binary(&storage_key).await?;

    let response = Response::builder()
        .header(header::CONTENT_TYPE, PDF_MIME_TYPE)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&record.original_name),
        )
        .header(header::CONTENT_LENGTH, content.len())
        .body(Body::from(content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })?;

    Ok(response)
}
