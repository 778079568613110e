//! Core data types and error definitions for the ingestion pipeline.

use thiserror::Error;

use crate::extract::ExtractError;
use crate::storage::StorageError;

/// Errors that abort an upload.
///
/// Embedding failures never appear here: they are confined to the chunk that caused
/// them and the pipeline carries on without a vector.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The uploaded payload could not be turned into text.
    #[error("failed to extract document text: {0}")]
    Extraction(#[from] ExtractError),
    /// The chunker rejected its configuration.
    #[error("failed to chunk document text: {0}")]
    Chunking(#[from] ChunkingError),
    /// The document and its chunks could not be stored atomically.
    #[error("failed to persist document: {0}")]
    Persistence(#[from] StorageError),
}

impl IngestError {
    /// Stable reason code surfaced in error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Extraction(_) => "extraction_failed",
            Self::Chunking(_) => "chunking_failed",
            Self::Persistence(_) => "persistence_failed",
        }
    }
}

/// Errors produced while splitting text into chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// A zero character budget can never produce a valid chunk.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}

/// One chunk ready for persistence: its position, its text, and the embedding when
/// the provider produced one.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRecord {
    /// Zero-based position of the chunk within its document.
    pub index: usize,
    /// Chunk text, at most the configured budget in characters.
    pub content: String,
    /// Embedding vector, absent when the provider failed for this chunk.
    pub embedding: Option<Vec<f32>>,
}

/// Summary of a completed ingestion, returned to the upload caller.
#[derive(Debug, Clone, Copy)]
pub struct IngestOutcome {
    /// Identity the store assigned to the document.
    pub document_id: i64,
    /// Number of chunks produced and persisted.
    pub chunk_count: usize,
    /// Number of chunks persisted together with an embedding.
    pub embedded_count: usize,
    /// Character budget that was applied while chunking.
    pub chunk_size: usize,
}
