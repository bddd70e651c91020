use std::io;

use localrag_memory::embedding::EmbeddingError;
use localrag_memory::generation::GenerationError;
use localrag_memory::store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagErr>;

#[derive(Error, Debug)]
pub enum RagErr {
    /// Missing or invalid input detected before a pipeline starts.
    #[error("configuration error: {0}")]
    Config(String),

    /// The backing store could not be created, opened or written.
    #[error("vector store error: {0}")]
    Store(#[from] StoreError),

    /// The embedding backend failed; the current run is aborted.
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}
