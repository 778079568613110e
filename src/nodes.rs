//! Flat-file "visible nodes" collection.
//!
//! A small side feature of the HTTP surface: a JSON array of `{id, name, text, link}`
//! records kept in a single file for the graph frontend. The ingestion pipeline never
//! reads or writes this collection. Access is serialized behind a mutex so concurrent
//! requests cannot interleave read-modify-write cycles on the file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors raised by the visible-nodes store.
#[derive(Debug, Error)]
pub enum NodeStoreError {
    /// A node with the same id is already present.
    #[error("Node {0} already exists")]
    AlreadyExists(i64),
    /// The backing file could not be read or written.
    #[error("Failed to access node history file: {0}")]
    Io(#[from] std::io::Error),
    /// The backing file does not contain a valid node array.
    #[error("Failed to decode node history file: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One record of the visible-nodes collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleNode {
    /// Caller-supplied identifier, unique within the collection.
    pub id: i64,
    /// Display name of the node.
    pub name: String,
    /// Free-form text attached to the node.
    pub text: String,
    /// Link associated with the node.
    pub link: String,
}

/// JSON-file-backed store for visible nodes.
pub struct NodeStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl NodeStore {
    /// Create a store backed by the given file. The file is created on first access.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Return every stored node in insertion order.
    pub async fn list(&self) -> Result<Vec<VisibleNode>, NodeStoreError> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    /// Append a node if its id is not taken yet, returning the updated collection.
    pub async fn add(&self, node: VisibleNode) -> Result<Vec<VisibleNode>, NodeStoreError> {
        let _guard = self.lock.lock().await;
        let mut nodes = self.load().await?;
        if nodes.iter().any(|existing| existing.id == node.id) {
            return Err(NodeStoreError::AlreadyExists(node.id));
        }
        nodes.push(node);
        self.save(&nodes).await?;
        Ok(nodes)
    }

    async fn load(&self) -> Result<Vec<VisibleNode>, NodeStoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tokio::fs::write(&self.path, b"[]").await?;
                Ok(Vec::new())
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn save(&self, nodes: &[VisibleNode]) -> Result<(), NodeStoreError> {
        let raw = serde_json::to_vec(nodes)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }
}
