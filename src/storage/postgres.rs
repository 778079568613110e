//! sqlx-backed document store for Postgres with the pgvector extension.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::ingest::ChunkRecord;
use crate::storage::DocumentStore;
use crate::storage::types::{DocumentRecord, StorageError};

/// Build a lazily-connecting pool for the given Postgres URL.
///
/// No connection is attempted here; the first query pays that cost. A malformed URL
/// is the only startup-time failure.
pub fn connect_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy(database_url)
}

/// Document store backed by Postgres.
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Wrap an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the pgvector extension, the document tables, and the vector index if
    /// they do not exist yet. `dimension` fixes the width of the `embedding` column.
    pub async fn ensure_schema(&self, dimension: usize) -> Result<(), StorageError> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                id BIGSERIAL PRIMARY KEY,
                source TEXT NOT NULL,
                description TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await?;

        let chunks_table = format!(
            "CREATE TABLE IF NOT EXISTS chunks (
                id BIGSERIAL PRIMARY KEY,
                document_id BIGINT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding VECTOR({dimension}),
                UNIQUE (document_id, chunk_index)
            )"
        );
        sqlx::query(&chunks_table).execute(&self.pool).await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS chunks_embedding_idx
             ON chunks USING hnsw (embedding vector_cosine_ops)",
        )
        .execute(&self.pool)
        .await?;

        tracing::debug!(dimension, "Document schema ensured");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn persist_document(
        &self,
        source: &str,
        description: &str,
        chunks: &[ChunkRecord],
    ) -> Result<i64, StorageError> {
        let mut tx = self.pool.begin().await?;

        let document_id: i64 = sqlx::query_scalar(
            "INSERT INTO documents (source, description) VALUES ($1, $2) RETURNING id",
        )
        .bind(source)
        .bind(description)
        .fetch_one(&mut *tx)
        .await?;

        for chunk in chunks {
            let embedding = chunk.embedding.as_deref().map(vector_literal);
            sqlx::query(
                "INSERT INTO chunks (document_id, chunk_index, content, embedding)
                 VALUES ($1, $2, $3, $4::vector)",
            )
            .bind(document_id)
            .bind(chunk.index as i32)
            .bind(&chunk.content)
            .bind(embedding)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(document_id)
    }

    async fn list_documents(&self, limit: i64) -> Result<Vec<DocumentRecord>, StorageError> {
        let records = sqlx::query_as::<_, DocumentRecord>(
            "SELECT d.id, d.source, d.description, d.created_at, COUNT(c.id) AS chunk_count
             FROM documents d
             LEFT JOIN chunks c ON c.document_id = d.id
             GROUP BY d.id
             ORDER BY d.id DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}

/// Render a vector in pgvector's text input form, e.g. `[0.1,0.2,0.3]`.
fn vector_literal(values: &[f32]) -> String {
    format!(
        "[{}]",
        values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_literal_matches_pgvector_input_syntax() {
        assert_eq!(vector_literal(&[0.25, -1.5, 2.0]), "[0.25,-1.5,2]");
        assert_eq!(vector_literal(&[1.0]), "[1]");
        assert_eq!(vector_literal(&[]), "[]");
    }
}
