//! Types used to define the fields of [`crate::config::Config`].

// Note this file should generally be restricted to simple struct/enum
// definitions that do not contain business logic.

use std::path::PathBuf;

use serde::Deserialize;

/// Contents of `localrag.toml`. Every field is optional.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ConfigToml {
    /// Directory holding `meta.json` and `index.jsonl`.
    #[serde(default)]
    pub store: Option<PathBuf>,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub query: QueryConfig,
}

/// Settings used when building or extending a store.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct IngestConfig {
    /// Window size in bytes.
    #[serde(default = "IngestConfig::default_chunk_size")]
    pub chunk_size: usize,

    /// Bytes shared between consecutive windows.
    #[serde(default = "IngestConfig::default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Embedding backend spec, e.g. `hash:384`. Required for ingest.
    #[serde(default)]
    pub embed_model: Option<String>,
}

impl IngestConfig {
    fn default_chunk_size() -> usize { 800 }
    fn default_chunk_overlap() -> usize { 200 }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: Self::default_chunk_size(),
            chunk_overlap: Self::default_chunk_overlap(),
            embed_model: None,
        }
    }
}

/// Settings used when answering a question against a store.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct QueryConfig {
    #[serde(default = "QueryConfig::default_k")]
    pub k: usize,

    #[serde(default = "QueryConfig::default_max_tokens")]
    pub max_tokens: usize,

    /// `<= 0` selects greedy decoding.
    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "QueryConfig::default_llm_model")]
    pub llm_model: String,

    /// Used only when the store does not record its embedding model.
    #[serde(default)]
    pub embed_model: Option<String>,
}

impl QueryConfig {
    fn default_k() -> usize { 4 }
    fn default_max_tokens() -> usize { 256 }
    fn default_llm_model() -> String { "extractive".to_string() }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            k: Self::default_k(),
            max_tokens: Self::default_max_tokens(),
            temperature: 0.0,
            llm_model: Self::default_llm_model(),
            embed_model: None,
        }
    }
}
