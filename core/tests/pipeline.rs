#![allow(clippy::unwrap_used)]

use std::fs;

use localrag_core::QueryOutcome;
use localrag_core::config::Config;
use localrag_core::config::ConfigOverrides;
use localrag_core::config::parse_config_toml;
use localrag_core::memory::ingest::IngestOptions;
use localrag_core::memory::ingest::ingest_embedder;
use localrag_core::memory::ingest::ingest_paths;
use localrag_core::memory::ingest::open_store_for;
use localrag_core::memory::query::run_query;
use localrag_core::memory::sources::discover_sources;
use localrag_memory::store::jsonl::JsonlVectorStore;
use pretty_assertions::assert_eq;

fn config(store: &std::path::Path) -> Config {
    let cfg = parse_config_toml(
        r#"
[ingest]
chunk_size = 120
chunk_overlap = 20
embed_model = "hash:128"
"#,
    )
    .unwrap();
    Config::load_from_base_config_with_overrides(
        cfg,
        ConfigOverrides { store_dir: Some(store.to_path_buf()), ..Default::default() },
    )
}

#[test]
fn ingest_then_query_from_a_fresh_process_view() {
    let tmp = tempfile::tempdir().unwrap();
    let docs = tmp.path().join("docs");
    fs::create_dir_all(docs.join("nested")).unwrap();
    fs::write(docs.join("volcano.md"), "Volcanoes erupt molten rock called lava.").unwrap();
    fs::write(docs.join("nested/bees.txt"), "Honey bees communicate with a waggle dance.").unwrap();
    fs::write(docs.join("skip.json"), "{\"bees\": true}").unwrap();

    let config = config(&tmp.path().join("store"));
    let embedder = ingest_embedder(&config).unwrap();
    let files = discover_sources(&docs);
    assert_eq!(files.len(), 2);

    let mut store = open_store_for(&config.store_dir, &*embedder).unwrap();
    let report = ingest_paths(&mut store, &*embedder, &files, IngestOptions::from(&config)).unwrap();
    assert_eq!(report.appended, 2);
    drop(store);

    let reopened = JsonlVectorStore::open(&config.store_dir).unwrap();
    assert_eq!(reopened.len(), 2);
    assert_eq!(reopened.embed_model(), "hash:128");
    assert_eq!(reopened.embedding_dim(), 128);

    let mut query_config = config.clone();
    query_config.query.k = 1;
    let outcome = run_query(&query_config, "How do honey bees communicate?").unwrap();
    let QueryOutcome::Answer { answer, hits } = outcome else { panic!("expected an answer") };
    assert!(hits[0].source.ends_with("bees.txt"));
    assert_eq!(answer, "Honey bees communicate with a waggle dance.");
}

#[test]
fn reingesting_appends_again_and_reuses_store_dimension() {
    let tmp = tempfile::tempdir().unwrap();
    let doc = tmp.path().join("one.txt");
    fs::write(&doc, "Short note.").unwrap();
    let config = config(&tmp.path().join("store"));
    let embedder = ingest_embedder(&config).unwrap();
    for expected in [1, 2] {
        let mut store = open_store_for(&config.store_dir, &*embedder).unwrap();
        ingest_paths(&mut store, &*embedder, &[doc.clone()], IngestOptions::from(&config)).unwrap();
        assert_eq!(store.len(), expected);
    }
    let store = JsonlVectorStore::open(&config.store_dir).unwrap();
    assert_eq!(store.sources().len(), 1);
}
