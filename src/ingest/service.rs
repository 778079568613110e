//! Ingestion service coordinating extraction, chunking, embedding, and persistence.

use std::sync::Arc;

use async_trait::async_trait;

use crate::embedding::EmbeddingClient;
use crate::extract::TextExtractor;
use crate::ingest::chunking::chunk_text;
use crate::ingest::types::{ChunkRecord, IngestError, IngestOutcome};
use crate::metrics::{IngestMetrics, MetricsSnapshot};
use crate::storage::{DocumentRecord, DocumentStore, StorageError};

/// Coordinates the full ingestion pipeline for one uploaded document: text extraction,
/// semantic chunking, per-chunk embedding, and the atomic document+chunks write.
///
/// The service owns long-lived handles to the extractor, embedding client, document store,
/// and metrics registry so every upload reuses the same components. Construct it once near
/// process start and share it through an `Arc`.
pub struct IngestService {
    extractor: Box<dyn TextExtractor>,
    embedding_client: Box<dyn EmbeddingClient>,
    store: Box<dyn DocumentStore>,
    metrics: Arc<IngestMetrics>,
    max_chunk_size: usize,
}

/// Abstraction over the ingestion pipeline used by the HTTP surface.
#[async_trait]
pub trait IngestApi: Send + Sync {
    /// Run one upload through the pipeline and persist the result.
    async fn ingest_document(
        &self,
        source_name: &str,
        description: &str,
        bytes: &[u8],
    ) -> Result<IngestOutcome, IngestError>;

    /// Enumerate persisted documents, newest first.
    async fn list_documents(&self, limit: i64) -> Result<Vec<DocumentRecord>, StorageError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl IngestService {
    /// Build an ingestion service from its collaborators.
    ///
    /// `max_chunk_size` is the character budget applied to every upload.
    pub fn new(
        extractor: Box<dyn TextExtractor>,
        embedding_client: Box<dyn EmbeddingClient>,
        store: Box<dyn DocumentStore>,
        max_chunk_size: usize,
    ) -> Self {
        Self {
            extractor,
            embedding_client,
            store,
            metrics: Arc::new(IngestMetrics::new()),
            max_chunk_size,
        }
    }

    /// Extract, chunk, embed, and persist one uploaded document.
    ///
    /// Stages run strictly in order. Extraction and persistence failures abort the upload;
    /// an embedding failure only costs that chunk its vector. Every chunk the chunker
    /// produces is handed to the store exactly once, indexed from zero in text order.
    pub async fn ingest_document(
        &self,
        source_name: &str,
        description: &str,
        bytes: &[u8],
    ) -> Result<IngestOutcome, IngestError> {
        tracing::info!(
            source = source_name,
            bytes = bytes.len(),
            "Ingesting document"
        );
        let text = self.extractor.extract(bytes)?;
        tracing::debug!(source = source_name, characters = text.len(), "Text extracted");

        let chunks = chunk_text(&text, self.max_chunk_size)?;
        tracing::debug!(
            source = source_name,
            chunks = chunks.len(),
            chunk_size = self.max_chunk_size,
            "Text chunked"
        );

        let mut records: Vec<ChunkRecord> = Vec::with_capacity(chunks.len());
        let mut embedded_count = 0usize;
        for (index, content) in chunks.into_iter().enumerate() {
            let embedding = match self.embedding_client.embed(&content).await {
                Ok(vector) => {
                    embedded_count += 1;
                    Some(vector)
                }
                Err(error) => {
                    tracing::warn!(
                        source = source_name,
                        chunk_index = index,
                        error = %error,
                        "Embedding failed; chunk will be stored without a vector"
                    );
                    None
                }
            };
            records.push(ChunkRecord {
                index,
                content,
                embedding,
            });
        }

        let document_id = self
            .store
            .persist_document(source_name, description, &records)
            .await?;

        let chunk_count = records.len();
        self.metrics
            .record_document(chunk_count as u64, embedded_count as u64);
        tracing::info!(
            document_id,
            source = source_name,
            chunks = chunk_count,
            embedded = embedded_count,
            "Document ingested"
        );

        Ok(IngestOutcome {
            document_id,
            chunk_count,
            embedded_count,
            chunk_size: self.max_chunk_size,
        })
    }

    /// Enumerate persisted documents through the underlying store.
    pub async fn list_documents(&self, limit: i64) -> Result<Vec<DocumentRecord>, StorageError> {
        self.store.list_documents(limit).await
    }

    /// Return the current ingestion metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl IngestApi for IngestService {
    async fn ingest_document(
        &self,
        source_name: &str,
        description: &str,
        bytes: &[u8],
    ) -> Result<IngestOutcome, IngestError> {
        IngestService::ingest_document(self, source_name, description, bytes).await
    }

    async fn list_documents(&self, limit: i64) -> Result<Vec<DocumentRecord>, StorageError> {
        IngestService::list_documents(self, limit).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        IngestService::metrics_snapshot(self)
    }
}
