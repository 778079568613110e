//! Postgres + pgvector document store integration.

use async_trait::async_trait;

use crate::ingest::ChunkRecord;

pub mod postgres;
pub mod types;

pub use postgres::{PgDocumentStore, connect_pool};
pub use types::{DocumentRecord, StorageError};

/// Interface implemented by document persistence backends.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Atomically create a document row plus one row per chunk.
    ///
    /// Either everything lands or nothing does; a failure part-way through must leave
    /// no trace of the document. Returns the identity assigned to the document.
    async fn persist_document(
        &self,
        source: &str,
        description: &str,
        chunks: &[ChunkRecord],
    ) -> Result<i64, StorageError>;

    /// Enumerate stored documents with their chunk counts, newest first.
    async fn list_documents(&self, limit: i64) -> Result<Vec<DocumentRecord>, StorageError>;
}
