//! Root of the `localrag-core` library.
//!
//! Ties the retrieval primitives from `localrag-memory` together: loading
//! configuration, resolving embedding/generation backends, and running the
//! ingest and query pipelines.

pub mod config;
pub mod config_types;
pub mod error;
pub mod memory;

pub use error::RagErr;
pub use error::Result;
pub use memory::ingest::IngestOptions;
pub use memory::ingest::IngestReport;
pub use memory::query::QueryOptions;
pub use memory::query::QueryOutcome;
