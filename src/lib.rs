//! pdfshelf - PDF upload and viewing service
//!
//! Stores uploaded PDFs as binaries on disk with a metadata record per file
//! in SQLite, and serves them over a JSON HTTP API.

pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use config::Config;
pub use db::Database;
pub use error::{Result, ShelfError};
pub use file::{
    BinaryStore, FileRecord, FileRepository, FileService, FileStorage, MetadataStore,
    NewFileRecord, UploadRequest,
};
pub use web::WebServer;
