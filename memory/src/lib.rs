//! Retrieval engine primitives: chunking, cosine ranking, the append-only
//! vector store and the capability traits for embedding and generation.

pub mod chunker;
pub mod embedding;
pub mod generation;
pub mod knn;
pub mod store;
