//! Shared types used by the document store and its callers.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors returned while interacting with the document store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying database rejected the operation.
    #[error("Database request failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// A persisted document row, joined with its chunk count for listings.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct DocumentRecord {
    /// Identity assigned by the store on insert.
    pub id: i64,
    /// Original upload file name.
    pub source: String,
    /// Free-form description supplied with the upload.
    pub description: String,
    /// Insertion timestamp assigned by the database.
    pub created_at: DateTime<Utc>,
    /// Number of chunk rows stored for this document.
    pub chunk_count: i64,
}
