//! File management module for pdfshelf.
//!
//! This module provides the PDF lifecycle:
//! - Binary storage with atomic writes and generated storage keys
//! - File metadata records in SQLite
//! - Upload validation (PDF type and signature checks)
//! - Upload, listing, viewing and deletion pipelines that keep both stores
//!   consistent

mod metadata;
mod service;
mod storage;
mod validation;

pub use metadata::{
    format_timestamp, parse_timestamp, FileRecord, FileRepository, MetadataStore, NewFileRecord,
};
pub use service::{FileService, UploadRequest};
pub use storage::{
    generate_storage_key, is_partial_key, is_valid_key, BinaryStore, FileStorage,
};
pub use validation::{clean_original_name, ensure_pdf, has_pdf_signature, PDF_MIME_TYPE};
