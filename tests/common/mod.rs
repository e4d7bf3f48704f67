//! Test helpers for the HTTP API tests.
//!
//! Provides a `TestContext` wiring a temporary binary store and an in-memory
//! database into the full application router.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use tempfile::TempDir;

use pdfshelf::config::ServerConfig;
use pdfshelf::{BinaryStore, Database, FileRepository, FileService, FileStorage, WebServer};

/// Upload limit used by the test server.
pub const TEST_MAX_UPLOAD_BYTES: u64 = 1024 * 1024;

/// Running test application.
pub struct TestContext {
    pub server: TestServer,
    pub service: FileService,
    pub storage: Arc<FileStorage>,
    pub db: Database,
    _dir: TempDir,
}

impl TestContext {
    /// Create a test application with an in-memory database.
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db = Database::open_in_memory()
            .await
            .expect("Failed to create test database");
        let storage = Arc::new(FileStorage::new(dir.path()).expect("Failed to create storage"));

        let service = FileService::new(
            storage.clone(),
            Arc::new(FileRepository::new(db.pool().clone())),
            TEST_MAX_UPLOAD_BYTES,
        );

        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec![],
            serve_static: false,
            static_path: "frontend/dist".to_string(),
        };
        let router = WebServer::new(&config, service.clone())
            .expect("Failed to create web server")
            .router();

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            service,
            storage,
            db,
            _dir: dir,
        }
    }

    /// Keys currently held by the binary store.
    pub async fn stored_keys(&self) -> Vec<String> {
        self.storage.list_keys().await.expect("Failed to list keys")
    }
}

/// Minimal content that passes PDF validation, padded to `len` bytes.
pub fn pdf_bytes(len: usize) -> Vec<u8> {
    let mut content = b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n".to_vec();
    content.resize(len.max(content.len()), b' ');
    content
}

/// Multipart form with a single file part.
pub fn file_form(field: &str, content: Vec<u8>, filename: &str, mime: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        field,
        Part::bytes(content).file_name(filename).mime_type(mime),
    )
}

/// Multipart form carrying a PDF in the `pdf` field.
pub fn pdf_form(content: Vec<u8>, filename: &str) -> MultipartForm {
    file_form("pdf", content, filename, "application/pdf")
}
