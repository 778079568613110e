#![deny(missing_docs)]

//! Core library for the Docpulp ingestion server.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// PDF text extraction.
pub mod extract;
/// Document ingestion pipeline.
pub mod ingest;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion metrics helpers.
pub mod metrics;
/// Flat-file visible-nodes collection.
pub mod nodes;
/// Postgres document store integration.
pub mod storage;
