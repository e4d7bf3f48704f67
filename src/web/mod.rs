//! Web API module for pdfshelf.
//!
//! This module provides the JSON HTTP API over the file lifecycle service,
//! plus serving of stored PDFs for in-browser viewing.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::{create_router, ApiDoc};
pub use server::WebServer;
