use std::collections::BTreeMap;

use localrag_memory::embedding::EmbeddingError;
use localrag_memory::embedding::EmbeddingProvider;
use sha1::Digest;

pub const DEFAULT_HASH_DIM: usize = 384;

/// Deterministic feature-hashing embedder.
///
/// Each lowercase alphanumeric token is hashed with SHA-1 into one of `dim`
/// buckets with a pseudo-random sign. Term counts are weighted with
/// `1 + ln(tf)` and the result is L2-normalised, so texts sharing vocabulary
/// have positive cosine similarity. SHA-1 keeps bucket assignment stable
/// across builds, which matters because vectors are persisted.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
    model_name: String,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim, model_name: format!("hash:{dim}") }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_DIM)
    }
}

/// Lowercased runs of alphanumeric characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn bucket_and_sign(token: &str, dim: usize) -> (usize, f32) {
    let digest = sha1::Sha1::digest(token.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    let bucket = (u64::from_le_bytes(head) % dim as u64) as usize;
    let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
    (bucket, sign)
}

impl EmbeddingProvider for HashingEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if self.dim == 0 {
            return Err(EmbeddingError::InvalidDimension { expected: 1, got: 0 });
        }
        // BTreeMap keeps accumulation order, and therefore the floats, stable.
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for tok in tokenize(text) {
            *counts.entry(tok).or_insert(0) += 1;
        }

        let mut acc = vec![0.0f64; self.dim];
        for (tok, tf) in &counts {
            let (bucket, sign) = bucket_and_sign(tok, self.dim);
            acc[bucket] += sign as f64 * (1.0 + (*tf as f64).ln());
        }

        let norm = acc.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for v in acc.iter_mut() {
                *v /= norm;
            }
        }
        Ok(acc.into_iter().map(|v| v as f32).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use localrag_memory::embedding::cosine_similarity;
    use localrag_memory::embedding::l2_norm;
    use pretty_assertions::assert_eq;

    #[test]
    fn tokenize_lowercases_and_splits_on_punctuation() {
        assert_eq!(tokenize("Hello, World! x2-y"), vec!["hello", "world", "x2", "y"]);
        assert!(tokenize("  ,;  ").is_empty());
    }

    #[test]
    fn embedding_has_requested_dimension_and_unit_norm() {
        let e = HashingEmbedder::new(64);
        let v = e.embed("the rust borrow checker").unwrap();
        assert_eq!(v.len(), 64);
        assert!((l2_norm(&v) - 1.0).abs() < 1e-5);
        assert_eq!(e.model_name(), "hash:64");
    }

    #[test]
    fn same_text_same_vector() {
        let e = HashingEmbedder::default();
        assert_eq!(e.embed("Ferris the crab").unwrap(), e.embed("ferris THE crab!").unwrap());
    }

    #[test]
    fn shared_vocabulary_scores_higher() {
        let e = HashingEmbedder::new(256);
        let q = e.embed("how do lifetimes work in rust").unwrap();
        let near = e.embed("Lifetimes in Rust describe how long references are valid.").unwrap();
        let far = e.embed("Bake the bread at two hundred degrees.").unwrap();
        assert!(cosine_similarity(&q, &near) > cosine_similarity(&q, &far));
    }

    #[test]
    fn tokenless_text_is_the_zero_vector() {
        let v = HashingEmbedder::new(8).embed("...").unwrap();
        assert_eq!(v, vec![0.0; 8]);
    }

    #[test]
    fn zero_dimension_is_an_error() {
        assert!(HashingEmbedder::new(0).embed("x").is_err());
    }
}
