pub mod backends;
pub mod extractive;
pub mod hashing_embeddings;
pub mod ingest;
pub mod prompt;
pub mod query;
pub mod sources;
