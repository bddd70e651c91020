use std::path::Path;
use std::path::PathBuf;

use localrag_memory::chunker::chunk_text;
use localrag_memory::embedding::EmbeddingProvider;
use localrag_memory::store::Record;
use localrag_memory::store::jsonl::JsonlVectorStore;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::Config;
use crate::error::RagErr;
use crate::error::Result;
use crate::memory::backends::embedder_from_spec;
use crate::memory::sources::read_source_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl From<&Config> for IngestOptions {
    fn from(config: &Config) -> Self {
        Self { chunk_size: config.ingest.chunk_size, chunk_overlap: config.ingest.chunk_overlap }
    }
}

/// A named text awaiting chunking. `source` becomes the record provenance
/// and the prefix of every record id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    pub source: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub sources: usize,
    pub chunks: usize,
    /// Records durably appended to the store.
    pub appended: usize,
    /// Records the store refused: wrong dimension or non-finite components.
    pub rejected: usize,
}

/// Resolve the embedding backend required for ingest.
pub fn ingest_embedder(config: &Config) -> Result<Box<dyn EmbeddingProvider>> {
    let spec = config.ingest.embed_model.as_deref().ok_or_else(|| {
        RagErr::Config("no embedding backend: pass --embed-model or set ingest.embed_model".to_string())
    })?;
    embedder_from_spec(spec)
}

/// Open (or create) the store at `dir` sized for `embedder`.
pub fn open_store_for(dir: &Path, embedder: &dyn EmbeddingProvider) -> Result<JsonlVectorStore> {
    Ok(JsonlVectorStore::init_or_load(dir, embedder.dimension(), embedder.model_name())?)
}

/// Chunk, embed and append every text in order.
///
/// An embedding failure aborts the run; records appended before the failure
/// stay in the store.
pub fn ingest_texts<E, I>(
    store: &mut JsonlVectorStore,
    embedder: &E,
    texts: I,
    opts: IngestOptions,
) -> Result<IngestReport>
where
    E: EmbeddingProvider + ?Sized,
    I: IntoIterator<Item = SourceText>,
{
    let mut report = IngestReport::default();
    for SourceText { source, text } in texts {
        report.sources += 1;
        let chunks = chunk_text(&text, opts.chunk_size, opts.chunk_overlap);
        debug!("{source}: {} chunk(s)", chunks.len());
        for (idx, chunk) in chunks.into_iter().enumerate() {
            report.chunks += 1;
            let embedding = embedder.embed(&chunk)?;
            let rec = Record { id: format!("{source}#{idx}"), source: source.clone(), text: chunk, embedding };
            if store.append(rec)? {
                report.appended += 1;
            } else {
                report.rejected += 1;
            }
        }
    }
    if report.rejected > 0 {
        warn!(
            "{} chunk(s) rejected by store (embedder `{}` dim {}, store dim {})",
            report.rejected,
            embedder.model_name(),
            embedder.dimension(),
            store.embedding_dim()
        );
    }
    info!(
        "ingested {} source(s): {} chunk(s), {} appended",
        report.sources, report.chunks, report.appended
    );
    Ok(report)
}

/// Ingest files by path, reading each lazily. Unreadable files are logged
/// and contribute no chunks.
pub fn ingest_paths<E>(
    store: &mut JsonlVectorStore,
    embedder: &E,
    paths: &[PathBuf],
    opts: IngestOptions,
) -> Result<IngestReport>
where
    E: EmbeddingProvider + ?Sized,
{
    let texts = paths.iter().map(|path| {
        let text = read_source_text(path).unwrap_or_else(|e| {
            warn!("failed to read {}: {e}", path.display());
            String::new()
        });
        SourceText { source: path.to_string_lossy().into_owned(), text }
    });
    ingest_texts(store, embedder, texts, opts)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use localrag_memory::embedding::EmbeddingError;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    /// Embeds every text as `[len, 1]`.
    struct LenEmbedder;

    impl EmbeddingProvider for LenEmbedder {
        fn model_name(&self) -> &str { "len" }
        fn dimension(&self) -> usize { 2 }
        fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    /// Succeeds `ok` times, then fails.
    struct FlakyEmbedder {
        ok: usize,
        calls: AtomicUsize,
    }

    impl EmbeddingProvider for FlakyEmbedder {
        fn model_name(&self) -> &str { "flaky" }
        fn dimension(&self) -> usize { 2 }
        fn embed(&self, _text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.ok {
                Ok(vec![1.0, 0.0])
            } else {
                Err(EmbeddingError::Backend("model crashed".to_string()))
            }
        }
    }

    struct WideEmbedder;

    impl EmbeddingProvider for WideEmbedder {
        fn model_name(&self) -> &str { "wide" }
        fn dimension(&self) -> usize { 3 }
        fn embed(&self, _text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
            Ok(vec![1.0, 0.0, 0.0])
        }
    }

    fn src(source: &str, text: &str) -> SourceText {
        SourceText { source: source.into(), text: text.into() }
    }

    const OPTS: IngestOptions = IngestOptions { chunk_size: 4, chunk_overlap: 2 };

    #[test]
    fn records_are_numbered_per_source_in_chunk_order() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = open_store_for(tmp.path(), &LenEmbedder).unwrap();
        let report = ingest_texts(&mut store, &LenEmbedder, vec![src("a", "abcdefghij"), src("b", "xy")], OPTS).unwrap();
        assert_eq!(report, IngestReport { sources: 2, chunks: 5, appended: 5, rejected: 0 });

        let ids: Vec<&str> = store.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a#0", "a#1", "a#2", "a#3", "b#0"]);
        let texts: Vec<&str> = store.records().iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["abcd", "cdef", "efgh", "ghij", "xy"]);
        assert_eq!(store.records()[4].source, "b");
    }

    #[test]
    fn embedding_failure_aborts_but_keeps_prior_appends() {
        let tmp = tempfile::tempdir().unwrap();
        let flaky = FlakyEmbedder { ok: 2, calls: AtomicUsize::new(0) };
        let mut store = open_store_for(tmp.path(), &flaky).unwrap();
        let err = ingest_texts(&mut store, &flaky, vec![src("a", "abcdefghij")], OPTS).unwrap_err();
        assert!(matches!(err, RagErr::Embedding(_)));
        assert_eq!(store.len(), 2);
        assert_eq!(JsonlVectorStore::open(tmp.path()).unwrap().len(), 2);
    }

    #[test]
    fn wrong_dimension_chunks_are_counted_as_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = open_store_for(tmp.path(), &LenEmbedder).unwrap();
        let report = ingest_texts(&mut store, &WideEmbedder, vec![src("a", "abcdef")], OPTS).unwrap();
        assert_eq!(report.appended, 0);
        assert_eq!(report.rejected, 2);
        assert!(store.is_empty());
    }

    #[test]
    fn empty_texts_and_zero_chunk_size_ingest_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = open_store_for(tmp.path(), &LenEmbedder).unwrap();
        let zero = IngestOptions { chunk_size: 0, chunk_overlap: 0 };
        let report = ingest_texts(&mut store, &LenEmbedder, vec![src("a", "abc")], zero).unwrap();
        assert_eq!(report, IngestReport { sources: 1, chunks: 0, appended: 0, rejected: 0 });
        let report = ingest_texts(&mut store, &LenEmbedder, vec![src("b", "")], OPTS).unwrap();
        assert_eq!(report.chunks, 0);
    }

    #[test]
    fn unreadable_paths_contribute_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let good = tmp.path().join("good.txt");
        std::fs::write(&good, "abcdef").unwrap();
        let missing = tmp.path().join("gone.txt");
        let mut store = open_store_for(&tmp.path().join("store"), &LenEmbedder).unwrap();
        let report = ingest_paths(&mut store, &LenEmbedder, &[missing, good.clone()], OPTS).unwrap();
        assert_eq!(report.sources, 2);
        assert_eq!(report.appended, 2);
        assert_eq!(store.records()[0].id, format!("{}#0", good.display()));
    }

    #[test]
    fn ingest_requires_an_embedding_backend() {
        let config = Config::load_from_base_config_with_overrides(
            crate::config_types::ConfigToml::default(),
            crate::config::ConfigOverrides::default(),
        );
        assert!(matches!(ingest_embedder(&config), Err(RagErr::Config(_))));
    }
}
