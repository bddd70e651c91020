pub mod jsonl;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One persisted chunk: provenance, verbatim text and its embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub id: String,
    pub source: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub source: String,
    pub text: String,
    pub score: f32,
}

/// Contents of `meta.json`. Written once when the store is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreMeta {
    pub embedding_dim: usize,
    #[serde(default)]
    pub embed_model: String,
}

/// Outcome of replaying the append log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("serialize store record failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no vector store at {}", .0.display())]
    NotInitialized(PathBuf),
    #[error("invalid store metadata at {}: {reason}", path.display())]
    InvalidMetadata { path: PathBuf, reason: String },
    #[error("invalid embedding dimension {0}")]
    InvalidDimension(usize),
    #[error("vector store: lock timeout on {}", .0.display())]
    LockTimeout(PathBuf),
}
