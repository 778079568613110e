//! HTTP surface for Docpulp.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /upload` – Ingest a PDF sent as the raw request body. The content type must be
//!   `application/pdf`; anything else is rejected before the pipeline runs. Optional
//!   `filename` and `description` query parameters label the stored document. The response
//!   reports the document id, how many chunks were stored, and how many of those carry an
//!   embedding.
//! - `GET /documents` – List persisted documents with their chunk counts, newest first.
//! - `GET /nodes` / `POST /nodes` – The flat-file visible-nodes collection; listing returns
//!   every record, appending rejects duplicate ids. The ingestion pipeline never touches
//!   this collection.
//! - `GET /metrics` – Observe ingestion counters, including the embedded/unembedded split.
//!
//! Every failure is rendered as a structured `{"error": {"kind", "detail"}}` envelope so
//! callers can branch on a stable reason code.

use crate::ingest::{IngestApi, IngestError};
use crate::nodes::{NodeStore, NodeStoreError, VisibleNode};
use crate::storage::{DocumentRecord, StorageError};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Uploads larger than this are rejected by Axum before the handler runs.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

struct AppState<S> {
    service: Arc<S>,
    nodes: Arc<NodeStore>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            nodes: Arc::clone(&self.nodes),
        }
    }
}

/// Build the HTTP router exposing the ingestion API surface.
pub fn create_router<S>(service: Arc<S>, nodes: Arc<NodeStore>) -> Router
where
    S: IngestApi + 'static,
{
    Router::new()
        .route("/upload", post(upload_document::<S>))
        .route("/documents", get(list_documents::<S>))
        .route("/nodes", get(list_nodes::<S>).post(add_node::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(AppState { service, nodes })
}

/// Query parameters accepted by `POST /upload`.
#[derive(Deserialize)]
struct UploadParams {
    /// Original file name, stored as the document source.
    #[serde(default)]
    filename: Option<String>,
    /// Free-form description stored with the document.
    #[serde(default)]
    description: Option<String>,
}

/// Success response for `POST /upload`.
#[derive(Serialize)]
struct UploadResponse {
    /// Human-readable summary, noting partially-embedded uploads.
    message: String,
    /// Identity the store assigned to the document.
    document_id: i64,
    /// Number of chunks persisted for this document.
    chunk_count: usize,
    /// Number of chunks persisted together with an embedding.
    embedded_count: usize,
    /// Character budget applied while chunking.
    chunk_size: usize,
}

/// Ingest one uploaded PDF.
///
/// The content-type gate runs before any pipeline stage so a non-PDF upload never
/// creates a document. Embedding failures do not fail the request; the response
/// message calls them out instead.
async fn upload_document<S>(
    State(state): State<AppState<S>>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UploadResponse>, AppError>
where
    S: IngestApi,
{
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with("application/pdf") {
        return Err(AppError {
            status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
            kind: "invalid_content_type",
            detail: format!("expected application/pdf, got {content_type:?}"),
        });
    }

    let source = params.filename.unwrap_or_else(|| "upload.pdf".to_string());
    let description = params
        .description
        .unwrap_or_else(|| "PDF document".to_string());
    let outcome = state
        .service
        .ingest_document(&source, &description, &body)
        .await?;

    let message = if outcome.embedded_count == outcome.chunk_count {
        "Document ingested".to_string()
    } else {
        format!(
            "Document ingested; {} of {} chunks stored without an embedding",
            outcome.chunk_count - outcome.embedded_count,
            outcome.chunk_count
        )
    };
    tracing::info!(
        document_id = outcome.document_id,
        source = source,
        chunks = outcome.chunk_count,
        embedded = outcome.embedded_count,
        "Upload request completed"
    );
    Ok(Json(UploadResponse {
        message,
        document_id: outcome.document_id,
        chunk_count: outcome.chunk_count,
        embedded_count: outcome.embedded_count,
        chunk_size: outcome.chunk_size,
    }))
}

/// Query parameters accepted by `GET /documents`.
#[derive(Deserialize)]
struct ListDocumentsParams {
    /// Maximum number of documents to return (newest first).
    #[serde(default = "default_document_limit")]
    limit: i64,
}

fn default_document_limit() -> i64 {
    50
}

/// Response body for `GET /documents`.
#[derive(Serialize)]
struct DocumentsResponse {
    documents: Vec<DocumentRecord>,
}

/// List persisted documents through the store.
async fn list_documents<S>(
    State(state): State<AppState<S>>,
    Query(params): Query<ListDocumentsParams>,
) -> Result<Json<DocumentsResponse>, AppError>
where
    S: IngestApi,
{
    let documents = state.service.list_documents(params.limit.max(0)).await?;
    Ok(Json(DocumentsResponse { documents }))
}

/// Return every visible node, or a placeholder message while the collection is empty.
async fn list_nodes<S>(
    State(state): State<AppState<S>>,
) -> Result<Json<serde_json::Value>, AppError>
where
    S: IngestApi,
{
    let nodes = state.nodes.list().await?;
    if nodes.is_empty() {
        return Ok(Json(json!({ "message": "No nodes visible yet" })));
    }
    Ok(Json(json!({ "nodes": nodes })))
}

/// Append a visible node, rejecting duplicate ids.
async fn add_node<S>(
    State(state): State<AppState<S>>,
    Json(node): Json<VisibleNode>,
) -> Result<Json<serde_json::Value>, AppError>
where
    S: IngestApi,
{
    let nodes = state.nodes.add(node).await?;
    Ok(Json(json!({ "message": "Node added", "nodes": nodes })))
}

/// Return a concise metrics snapshot with ingestion counters.
async fn get_metrics<S>(State(state): State<AppState<S>>) -> Json<serde_json::Value>
where
    S: IngestApi,
{
    Json(json!(state.service.metrics_snapshot()))
}

/// Error envelope shared by every handler: an HTTP status plus a stable reason code
/// and a human-readable detail string.
struct AppError {
    status: StatusCode,
    kind: &'static str,
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "kind": self.kind,
                "detail": self.detail,
            }
        }));
        (self.status, body).into_response()
    }
}

impl From<IngestError> for AppError {
    fn from(error: IngestError) -> Self {
        let status = match &error {
            IngestError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            IngestError::Chunking(_) | IngestError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            kind: error.kind(),
            detail: error.to_string(),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(error: StorageError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "persistence_failed",
            detail: error.to_string(),
        }
    }
}

impl From<NodeStoreError> for AppError {
    fn from(error: NodeStoreError) -> Self {
        let (status, kind) = match &error {
            NodeStoreError::AlreadyExists(_) => (StatusCode::BAD_REQUEST, "node_exists"),
            NodeStoreError::Io(_) | NodeStoreError::Decode(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "node_store_failed")
            }
        };
        Self {
            status,
            kind,
            detail: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::create_router;
    use crate::extract::ExtractError;
    use crate::ingest::{IngestApi, IngestError, IngestOutcome};
    use crate::metrics::MetricsSnapshot;
    use crate::nodes::NodeStore;
    use crate::storage::{DocumentRecord, StorageError};
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Clone, Debug)]
    struct IngestCall {
        source: String,
        description: String,
        bytes: usize,
    }

    enum StubMode {
        Succeed(IngestOutcome),
        FailExtraction,
        FailPersistence,
    }

    struct StubIngestService {
        mode: StubMode,
        calls: Mutex<Vec<IngestCall>>,
    }

    impl StubIngestService {
        fn new(mode: StubMode) -> Self {
            Self {
                mode,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl IngestApi for StubIngestService {
        async fn ingest_document(
            &self,
            source_name: &str,
            description: &str,
            bytes: &[u8],
        ) -> Result<IngestOutcome, IngestError> {
            self.calls.lock().await.push(IngestCall {
                source: source_name.to_string(),
                description: description.to_string(),
                bytes: bytes.len(),
            });
            match &self.mode {
                StubMode::Succeed(outcome) => Ok(*outcome),
                StubMode::FailExtraction => Err(IngestError::Extraction(ExtractError::Parse(
                    "not a PDF header".into(),
                ))),
                StubMode::FailPersistence => {
                    Err(IngestError::Persistence(StorageError::Database(
                        sqlx::Error::PoolClosed,
                    )))
                }
            }
        }

        async fn list_documents(&self, _limit: i64) -> Result<Vec<DocumentRecord>, StorageError> {
            Ok(Vec::new())
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                documents_ingested: 3,
                chunks_ingested: 12,
                chunks_embedded: 10,
                embedding_failures: 2,
            }
        }
    }

    fn test_router(service: Arc<StubIngestService>) -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("temp dir");
        let nodes = Arc::new(NodeStore::new(dir.path().join("nodes.json")));
        (create_router(service, nodes), dir)
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn upload_reports_partial_embedding_in_the_message() {
        let service = Arc::new(StubIngestService::new(StubMode::Succeed(IngestOutcome {
            document_id: 41,
            chunk_count: 3,
            embedded_count: 2,
            chunk_size: 1000,
        })));
        let (app, _dir) = test_router(Arc::clone(&service));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/upload?filename=report.pdf&description=quarterly%20report")
                    .header("content-type", "application/pdf")
                    .body(Body::from(&b"%PDF-1.5 fake"[..]))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["document_id"], 41);
        assert_eq!(body["chunk_count"], 3);
        assert_eq!(body["embedded_count"], 2);
        assert!(
            body["message"]
                .as_str()
                .expect("message string")
                .contains("1 of 3 chunks"),
            "partial embedding must be called out: {body}"
        );

        let calls = service.calls.lock().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].source, "report.pdf");
        assert_eq!(calls[0].description, "quarterly report");
        assert_eq!(calls[0].bytes, b"%PDF-1.5 fake".len());
    }

    #[tokio::test]
    async fn non_pdf_content_type_is_rejected_before_the_pipeline() {
        let service = Arc::new(StubIngestService::new(StubMode::Succeed(IngestOutcome {
            document_id: 1,
            chunk_count: 0,
            embedded_count: 0,
            chunk_size: 1000,
        })));
        let (app, _dir) = test_router(Arc::clone(&service));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/upload")
                    .header("content-type", "text/plain")
                    .body(Body::from("just some text"))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let body = json_body(response).await;
        assert_eq!(body["error"]["kind"], "invalid_content_type");
        assert!(
            service.calls.lock().await.is_empty(),
            "pipeline must not run for rejected uploads"
        );
    }

    #[tokio::test]
    async fn extraction_failure_maps_to_a_structured_client_error() {
        let service = Arc::new(StubIngestService::new(StubMode::FailExtraction));
        let (app, _dir) = test_router(service);

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/upload")
                    .header("content-type", "application/pdf")
                    .body(Body::from("corrupt bytes"))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["error"]["kind"], "extraction_failed");
        assert!(
            body["error"]["detail"]
                .as_str()
                .expect("detail string")
                .contains("not a PDF header")
        );
    }

    #[tokio::test]
    async fn persistence_failure_maps_to_a_server_error() {
        let service = Arc::new(StubIngestService::new(StubMode::FailPersistence));
        let (app, _dir) = test_router(service);

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/upload")
                    .header("content-type", "application/pdf")
                    .body(Body::from(&b"%PDF"[..]))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"]["kind"], "persistence_failed");
    }

    #[tokio::test]
    async fn node_routes_list_and_append_with_duplicate_rejection() {
        let service = Arc::new(StubIngestService::new(StubMode::Succeed(IngestOutcome {
            document_id: 1,
            chunk_count: 0,
            embedded_count: 0,
            chunk_size: 1000,
        })));
        let (app, _dir) = test_router(service);

        let node = json!({
            "id": 5,
            "name": "ingestion",
            "text": "uploads land here",
            "link": "https://example.org/ingestion"
        });

        let empty_listing = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/nodes")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(empty_listing.status(), StatusCode::OK);
        let body = json_body(empty_listing).await;
        assert_eq!(body["message"], "No nodes visible yet");

        let created = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/nodes")
                    .header("content-type", "application/json")
                    .body(Body::from(node.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(created.status(), StatusCode::OK);
        let body = json_body(created).await;
        assert_eq!(body["message"], "Node added");
        assert_eq!(body["nodes"][0]["id"], 5);

        let duplicate = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/nodes")
                    .header("content-type", "application/json")
                    .body(Body::from(node.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);
        let body = json_body(duplicate).await;
        assert_eq!(body["error"]["kind"], "node_exists");

        let listing = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/nodes")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(listing.status(), StatusCode::OK);
        let body = json_body(listing).await;
        assert_eq!(body["nodes"].as_array().expect("node array").len(), 1);
    }

    #[tokio::test]
    async fn metrics_route_exposes_the_embedding_split() {
        let service = Arc::new(StubIngestService::new(StubMode::Succeed(IngestOutcome {
            document_id: 1,
            chunk_count: 0,
            embedded_count: 0,
            chunk_size: 1000,
        })));
        let (app, _dir) = test_router(service);

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/metrics")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["documents_ingested"], 3);
        assert_eq!(body["chunks_ingested"], 12);
        assert_eq!(body["chunks_embedded"], 10);
        assert_eq!(body["embedding_failures"], 2);
    }
}
