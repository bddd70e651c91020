use localrag_memory::embedding::EmbeddingProvider;
use localrag_memory::generation::GenerationParams;
use localrag_memory::generation::TextGenerator;
use localrag_memory::store::SearchHit;
use localrag_memory::store::StoreError;
use localrag_memory::store::jsonl::JsonlVectorStore;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::Config;
use crate::error::RagErr;
use crate::error::Result;
use crate::memory::backends::embedder_from_spec;
use crate::memory::backends::generator_from_spec;
use crate::memory::prompt::build_rag_prompt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryOptions {
    pub k: usize,
    pub max_tokens: usize,
    pub temperature: f32,
}

impl From<&Config> for QueryOptions {
    fn from(config: &Config) -> Self {
        Self { k: config.query.k, max_tokens: config.query.max_tokens, temperature: config.query.temperature }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Nothing relevant could be retrieved; the generator was not called.
    NoContext,
    Answer { answer: String, hits: Vec<SearchHit> },
}

/// Pick the embedder for querying `store`.
///
/// The model recorded in the store metadata is authoritative so queries are
/// embedded the way the records were. `fallback` is used only for stores that
/// never recorded one.
pub fn resolve_query_embedder(store: &JsonlVectorStore, fallback: Option<&str>) -> Result<Box<dyn EmbeddingProvider>> {
    let recorded = store.embed_model();
    if !recorded.is_empty() {
        if let Some(requested) = fallback {
            if requested.trim() != recorded {
                warn!("store was built with `{recorded}`; ignoring requested embedding backend `{requested}`");
            }
        }
        return embedder_from_spec(recorded);
    }
    match fallback {
        Some(spec) => embedder_from_spec(spec),
        None => Err(RagErr::Config(format!(
            "store {} records no embedding backend: pass --embed-model or set query.embed_model",
            store.dir().display()
        ))),
    }
}

fn ensure_question(question: &str) -> Result<()> {
    if question.trim().is_empty() {
        return Err(RagErr::Config("question must not be empty".to_string()));
    }
    Ok(())
}

/// Retrieve the top `k` records for `question` and ask `generator` to answer
/// from them.
pub fn answer_question<E, G>(
    store: &JsonlVectorStore,
    question: &str,
    embedder: &E,
    generator: &G,
    opts: QueryOptions,
) -> Result<QueryOutcome>
where
    E: EmbeddingProvider + ?Sized,
    G: TextGenerator + ?Sized,
{
    ensure_question(question)?;
    if embedder.dimension() != store.embedding_dim() {
        warn!(
            "embedder `{}` produces dim {} but store {} has dim {}",
            embedder.model_name(),
            embedder.dimension(),
            store.dir().display(),
            store.embedding_dim()
        );
        return Ok(QueryOutcome::NoContext);
    }
    let qvec = embedder.embed(question)?;
    let hits = store.query(&qvec, opts.k);
    if hits.is_empty() {
        debug!("no hits for question in {}", store.dir().display());
        return Ok(QueryOutcome::NoContext);
    }
    let prompt = build_rag_prompt(question, &hits);
    debug!("prompt is {} bytes over {} hit(s)", prompt.len(), hits.len());
    let params = GenerationParams { max_tokens: opts.max_tokens, temperature: opts.temperature };
    let answer = generator.generate(&prompt, params)?;
    info!("answered with {} via {}", generator.model_name(), embedder.model_name());
    Ok(QueryOutcome::Answer { answer, hits })
}

/// Open the configured store and answer `question` with the configured
/// backends. A store that was never initialized has no context.
pub fn run_query(config: &Config, question: &str) -> Result<QueryOutcome> {
    ensure_question(question)?;
    let store = match JsonlVectorStore::open(&config.store_dir) {
        Ok(store) => store,
        Err(StoreError::NotInitialized(dir)) => {
            info!("no store at {}", dir.display());
            return Ok(QueryOutcome::NoContext);
        }
        Err(e) => return Err(e.into()),
    };
    if store.is_empty() {
        return Ok(QueryOutcome::NoContext);
    }
    let embedder = resolve_query_embedder(&store, config.query.embed_model.as_deref())?;
    let generator = generator_from_spec(&config.query.llm_model)?;
    answer_question(&store, question, &*embedder, &*generator, QueryOptions::from(config))
}
