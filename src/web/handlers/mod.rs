//! API handlers for the pdfshelf HTTP API.

pub mod file;

pub use file::*;

use crate::file::FileService;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// File lifecycle service.
    pub files: FileService,
}

impl AppState {
    /// Create a new application state.
    pub fn new(files: FileService) -> Self {
        Self { files }
    }
}
