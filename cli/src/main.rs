use clap::Parser;
use localrag_core::config::Config;
use localrag_core::config::ConfigOverrides;
use localrag_core::memory::ingest::IngestOptions;
use localrag_core::memory::ingest::ingest_embedder;
use localrag_core::memory::ingest::ingest_paths;
use localrag_core::memory::ingest::open_store_for;
use localrag_core::memory::query::QueryOutcome;
use localrag_core::memory::query::run_query;
use localrag_core::memory::sources::discover_sources;
use localrag_memory::store::StoreError;
use localrag_memory::store::jsonl::JsonlVectorStore;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Local retrieval-augmented question answering over a directory of notes.
#[derive(Debug, Parser)]
#[clap(author, name = "localrag", version = env!("CARGO_PKG_VERSION"), bin_name = "localrag")]
struct MultitoolCli {
    /// Read settings from this TOML file instead of ./localrag.toml.
    #[clap(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` wins when set.
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[clap(subcommand)]
    subcommand: Subcommand,
}

#[derive(Debug, clap::Subcommand)]
enum Subcommand {
    /// Chunk, embed and store every .txt/.md file under a directory.
    Ingest(IngestCommand),

    /// Answer a question from the stored chunks.
    Query(QueryCommand),

    /// Print store metadata and record counts as JSON.
    Stats(StatsCommand),
}

#[derive(Debug, Parser)]
struct IngestCommand {
    /// File or directory to ingest.
    #[clap(long)]
    dir: PathBuf,

    #[clap(long)]
    store: Option<PathBuf>,

    /// Embedding backend, e.g. `hash:384`.
    #[clap(long)]
    embed_model: Option<String>,

    #[clap(long)]
    chunk_size: Option<usize>,

    #[clap(long)]
    chunk_overlap: Option<usize>,
}

#[derive(Debug, Parser)]
struct QueryCommand {
    #[clap(long, short = 'q')]
    question: String,

    #[clap(long)]
    store: Option<PathBuf>,

    /// Generation backend, e.g. `extractive` or `extractive:<seed>`.
    #[clap(long)]
    llm_model: Option<String>,

    /// Number of chunks to retrieve.
    #[clap(long)]
    k: Option<usize>,

    #[clap(long)]
    max_tokens: Option<usize>,

    /// Sampling temperature; 0 is greedy.
    #[clap(long = "temp")]
    temperature: Option<f32>,

    /// Only used when the store records no embedding backend.
    #[clap(long)]
    embed_model: Option<String>,
}

#[derive(Debug, Parser)]
struct StatsCommand {
    #[clap(long)]
    store: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = MultitoolCli::parse();
    init_tracing(cli.verbose);

    match cli.subcommand {
        Subcommand::Ingest(cmd) => run_ingest(cli.config, cmd),
        Subcommand::Query(cmd) => run_query_command(cli.config, cmd),
        Subcommand::Stats(cmd) => run_stats(cli.config, cmd),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // Logs go to stderr so stdout stays machine-readable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run_ingest(config_path: Option<PathBuf>, cmd: IngestCommand) -> anyhow::Result<()> {
    let overrides = ConfigOverrides {
        store_dir: cmd.store,
        chunk_size: cmd.chunk_size,
        chunk_overlap: cmd.chunk_overlap,
        ingest_embed_model: cmd.embed_model,
        ..Default::default()
    };
    let config = Config::load_with_overrides(config_path.as_deref(), overrides)?;
    let embedder = ingest_embedder(&config)?;

    let files = discover_sources(&cmd.dir);
    println!("Found {} files to ingest", files.len());

    let mut store = open_store_for(&config.store_dir, &*embedder)?;
    let report = ingest_paths(&mut store, &*embedder, &files, IngestOptions::from(&config))?;
    if report.rejected > 0 {
        tracing::warn!("{} chunk(s) were rejected by {}", report.rejected, store.dir().display());
    }
    println!("Ingested chunks: {}", report.appended);
    Ok(())
}

fn run_query_command(config_path: Option<PathBuf>, cmd: QueryCommand) -> anyhow::Result<()> {
    let overrides = ConfigOverrides {
        store_dir: cmd.store,
        k: cmd.k,
        max_tokens: cmd.max_tokens,
        temperature: cmd.temperature,
        llm_model: cmd.llm_model,
        query_embed_model: cmd.embed_model,
        ..Default::default()
    };
    let config = Config::load_with_overrides(config_path.as_deref(), overrides)?;
    match run_query(&config, &cmd.question)? {
        QueryOutcome::NoContext => println!("No context found in store."),
        QueryOutcome::Answer { answer, .. } => println!("{answer}"),
    }
    Ok(())
}

fn run_stats(config_path: Option<PathBuf>, cmd: StatsCommand) -> anyhow::Result<()> {
    let overrides = ConfigOverrides { store_dir: cmd.store, ..Default::default() };
    let config = Config::load_with_overrides(config_path.as_deref(), overrides)?;
    let store = match JsonlVectorStore::open(&config.store_dir) {
        Ok(store) => store,
        Err(StoreError::NotInitialized(dir)) => anyhow::bail!("no store at {}", dir.display()),
        Err(e) => return Err(e.into()),
    };
    let stats = serde_json::json!({
        "store": store.dir().display().to_string(),
        "embedding_dim": store.embedding_dim(),
        "embed_model": store.embed_model(),
        "records": store.len(),
        "skipped_lines": store.load_report().skipped,
        "sources": store.sources().len(),
    });
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
