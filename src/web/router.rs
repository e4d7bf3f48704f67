//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::dto::{FileResponse, FileUploadResponse, MessageResponse};
use super::handlers::{self, delete_file, get_file, list_files, upload_file, view_file, AppState};
use super::middleware::{create_cors_layer, security_headers};

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// OpenAPI document for the HTTP API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "pdfshelf API",
        description = "Upload, list, view and delete PDF files."
    ),
    paths(
        handlers::file::upload_file,
        handlers::file::list_files,
        handlers::file::get_file,
        handlers::file::delete_file,
        handlers::file::view_file,
    ),
    components(schemas(FileResponse, FileUploadResponse, MessageResponse)),
    tags((name = "files", description = "PDF file lifecycle"))
)]
pub struct ApiDoc;

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    cors_origins: &[String],
    max_upload_bytes: u64,
) -> Router {
    let body_limit = usize::try_from(max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES))
        .unwrap_or(usize::MAX);

    let api_routes = Router::new()
        .route("/upload", post(upload_file))
        .route("/pdfs", get(list_files))
        .route("/pdf/:id", get(get_file).delete(delete_file));

    Router::new()
        .nest("/api", api_routes)
        .route("/uploads/:storage_key", get(view_file))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(security_headers)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

/// Create the Swagger UI router serving the OpenAPI document.
pub fn create_swagger_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// Create a router serving the built front-end.
///
/// Unknown paths fall back to `index.html` so client-side routes resolve.
/// Returns `None` if the directory does not exist.
pub fn create_static_router(static_path: &str) -> Option<Router> {
    let path = Path::new(static_path);
    if !path.is_dir() {
        tracing::warn!(
            "Static directory not found, front-end will not be served: {}",
            static_path
        );
        return None;
    }

    let index = path.join("index.html");
    Some(Router::new().fallback_service(ServeDir::new(path).fallback(ServeFile::new(index))))
}
