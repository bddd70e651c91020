use std::path::Path;
use std::path::PathBuf;

use tracing::debug;

use crate::config_types::ConfigToml;
use crate::config_types::IngestConfig;
use crate::config_types::QueryConfig;
use crate::error::Result;

/// Looked up in the working directory when no explicit path is given.
pub const CONFIG_FILENAME: &str = "localrag.toml";

pub const DEFAULT_STORE_DIR: &str = ".rag_store";

/// Application configuration after merging defaults, the optional TOML file
/// and command-line overrides (in increasing precedence).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub store_dir: PathBuf,
    pub ingest: IngestConfig,
    pub query: QueryConfig,
}

/// Optional overrides, typically supplied as command-line flags.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub store_dir: Option<PathBuf>,
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
    pub ingest_embed_model: Option<String>,
    pub k: Option<usize>,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
    pub llm_model: Option<String>,
    pub query_embed_model: Option<String>,
}

impl Config {
    /// Load from `config_path` when given (it must exist), otherwise from
    /// `./localrag.toml` when present, otherwise from built-in defaults.
    pub fn load_with_overrides(config_path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let cfg = match config_path {
            Some(path) => load_config_as_toml(path)?,
            None => {
                let default_path = Path::new(CONFIG_FILENAME);
                if default_path.is_file() {
                    load_config_as_toml(default_path)?
                } else {
                    ConfigToml::default()
                }
            }
        };
        Ok(Self::load_from_base_config_with_overrides(cfg, overrides))
    }

    pub fn load_from_base_config_with_overrides(cfg: ConfigToml, overrides: ConfigOverrides) -> Self {
        let ConfigOverrides {
            store_dir,
            chunk_size,
            chunk_overlap,
            ingest_embed_model,
            k,
            max_tokens,
            temperature,
            llm_model,
            query_embed_model,
        } = overrides;

        let mut ingest = cfg.ingest;
        if let Some(v) = chunk_size { ingest.chunk_size = v; }
        if let Some(v) = chunk_overlap { ingest.chunk_overlap = v; }
        if ingest_embed_model.is_some() { ingest.embed_model = ingest_embed_model; }

        let mut query = cfg.query;
        if let Some(v) = k { query.k = v; }
        if let Some(v) = max_tokens { query.max_tokens = v; }
        if let Some(v) = temperature { query.temperature = v; }
        if let Some(v) = llm_model { query.llm_model = v; }
        if query_embed_model.is_some() { query.embed_model = query_embed_model; }

        Self {
            store_dir: store_dir
                .or(cfg.store)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR)),
            ingest,
            query,
        }
    }
}

fn load_config_as_toml(path: &Path) -> Result<ConfigToml> {
    debug!("loading config from {}", path.display());
    let contents = std::fs::read_to_string(path)?;
    parse_config_toml(&contents)
}

pub fn parse_config_toml(contents: &str) -> Result<ConfigToml> {
    Ok(toml::from_str::<ConfigToml>(contents)?)
}
