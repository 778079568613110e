use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing ingestion activity.
#[derive(Default)]
pub struct IngestMetrics {
    documents_ingested: AtomicU64,
    chunks_ingested: AtomicU64,
    chunks_embedded: AtomicU64,
    embedding_failures: AtomicU64,
}

impl IngestMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a persisted document: how many chunks it produced and how many of
    /// those carried an embedding into the store.
    pub fn record_document(&self, chunk_count: u64, embedded_count: u64) {
        self.documents_ingested.fetch_add(1, Ordering::Relaxed);
        self.chunks_ingested.fetch_add(chunk_count, Ordering::Relaxed);
        self.chunks_embedded
            .fetch_add(embedded_count, Ordering::Relaxed);
        self.embedding_failures
            .fetch_add(chunk_count.saturating_sub(embedded_count), Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_ingested: self.documents_ingested.load(Ordering::Relaxed),
            chunks_ingested: self.chunks_ingested.load(Ordering::Relaxed),
            chunks_embedded: self.chunks_embedded.load(Ordering::Relaxed),
            embedding_failures: self.embedding_failures.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of ingestion counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents persisted since startup.
    pub documents_ingested: u64,
    /// Total chunk count produced across all persisted documents.
    pub chunks_ingested: u64,
    /// Chunks stored together with an embedding vector.
    pub chunks_embedded: u64,
    /// Chunks stored without a vector because the provider failed.
    pub embedding_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_documents_and_chunks() {
        let metrics = IngestMetrics::new();
        metrics.record_document(2, 2);
        metrics.record_document(3, 1);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_ingested, 2);
        assert_eq!(snapshot.chunks_ingested, 5);
        assert_eq!(snapshot.chunks_embedded, 3);
        assert_eq!(snapshot.embedding_failures, 2);
    }

    #[test]
    fn snapshot_is_consistent() {
        let metrics = IngestMetrics::new();
        assert_eq!(metrics.snapshot().documents_ingested, 0);
        assert_eq!(metrics.snapshot().chunks_ingested, 0);
        assert_eq!(metrics.snapshot().embedding_failures, 0);
    }
}
