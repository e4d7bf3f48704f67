//! Database schema and migrations for pdfshelf.
//!
//! Migrations are applied sequentially when the database is first opened
//! or upgraded. Never edit a released migration; append a new one.

/// Database migrations.
///
/// Each migration is a SQL script executed in its own transaction.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: File records
    r#"
-- One row per uploaded document. AUTOINCREMENT keeps ids from being reused
-- after deletion.
CREATE TABLE files (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    original_name   TEXT NOT NULL,
    storage_key     TEXT NOT NULL UNIQUE,
    size_bytes      INTEGER NOT NULL CHECK (size_bytes >= 0),
    uploaded_at     TEXT NOT NULL           -- fixed-width RFC 3339, UTC
);

CREATE INDEX idx_files_uploaded_at ON files(uploaded_at);
"#,
];
