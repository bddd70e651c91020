//! Resolve backend spec strings (as found on the command line, in config
//! files and in store metadata) to capability implementations.

use localrag_memory::embedding::EmbeddingProvider;
use localrag_memory::generation::TextGenerator;

use crate::error::RagErr;
use crate::error::Result;
use crate::memory::extractive::ExtractiveGenerator;
use crate::memory::hashing_embeddings::DEFAULT_HASH_DIM;
use crate::memory::hashing_embeddings::HashingEmbedder;

/// `hash` or `hash:<dim>` selects [`HashingEmbedder`].
pub fn embedder_from_spec(spec: &str) -> Result<Box<dyn EmbeddingProvider>> {
    let spec = spec.trim();
    let (name, arg) = match spec.split_once(':') {
        Some((name, arg)) => (name, Some(arg)),
        None => (spec, None),
    };
    if !name.eq_ignore_ascii_case("hash") {
        return Err(RagErr::Config(format!("unknown embedding backend `{spec}` (expected `hash:<dim>`)")));
    }
    let dim = match arg {
        None => DEFAULT_HASH_DIM,
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|d| *d > 0)
            .ok_or_else(|| RagErr::Config(format!("invalid embedding dimension in `{spec}`")))?,
    };
    Ok(Box::new(HashingEmbedder::new(dim)))
}

/// `extractive` selects [`ExtractiveGenerator`]; `extractive:<seed>` fixes
/// its sampling seed.
pub fn generator_from_spec(spec: &str) -> Result<Box<dyn TextGenerator>> {
    let spec = spec.trim();
    let (name, arg) = match spec.split_once(':') {
        Some((name, arg)) => (name, Some(arg)),
        None => (spec, None),
    };
    if !name.eq_ignore_ascii_case("extractive") {
        return Err(RagErr::Config(format!("unknown generation backend `{spec}` (expected `extractive`)")));
    }
    match arg {
        None => Ok(Box::new(ExtractiveGenerator::new())),
        Some(raw) => {
            let seed = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| RagErr::Config(format!("invalid sampling seed in `{spec}`")))?;
            Ok(Box::new(ExtractiveGenerator::with_seed(seed)))
        }
    }
}
