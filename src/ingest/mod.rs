//! Document ingestion pipeline: extraction, chunking, embedding, and persistence.

pub mod chunking;
mod service;
pub mod types;

pub use service::{IngestApi, IngestService};
pub use types::{ChunkRecord, ChunkingError, IngestError, IngestOutcome};
