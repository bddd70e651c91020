use std::io;

/// Errors that can occur when producing embeddings.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("embedding has {got} dimensions, expected {expected}")]
    InvalidDimension { expected: usize, got: usize },
    #[error("embedding backend failed: {0}")]
    Backend(String),
}

/// Provider interface for fixed-dimension text embeddings.
///
/// Every vector returned by [`EmbeddingProvider::embed`] must have exactly
/// [`EmbeddingProvider::dimension`] components; the store keys its fixed
/// dimension off that value when it is first created.
pub trait EmbeddingProvider: Send + Sync {
    /// Identity recorded in store metadata as provenance.
    fn model_name(&self) -> &str;

    fn dimension(&self) -> usize;

    /// Generate an embedding vector for a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

impl<T: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<T> {
    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        (**self).embed(text)
    }
}

/// Euclidean norm accumulated in `f64`.
pub fn l2_norm(v: &[f32]) -> f64 {
    v.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt()
}

/// Compute the cosine similarity between two equal-length vectors.
/// Returns 0.0 when either vector has zero norm or the dimensions differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() { return 0.0; }
    let mut dot = 0.0f64;
    let mut na = 0.0f64;
    let mut nb = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let x = x as f64;
        let y = y as f64;
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 { return 0.0; }
    (dot / (na.sqrt() * nb.sqrt())) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_orders_similarities() {
        let q = vec![1.0, 0.0, 0.0];
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.5, 0.5, 0.0];
        let c = vec![0.0, 1.0, 0.0];
        let s_a = cosine_similarity(&q, &a);
        let s_b = cosine_similarity(&q, &b);
        let s_c = cosine_similarity(&q, &c);
        assert!(s_a > s_b && s_b > s_c);
        assert!((s_a - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_is_zero_for_zero_norm_or_mismatched_dims() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn opposite_vectors_score_minus_one() {
        let s = cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]);
        assert!((s + 1.0).abs() < 1e-6);
    }

    #[test]
    fn norm_matches_pythagoras() {
        assert!((l2_norm(&[3.0, 4.0]) - 5.0).abs() < 1e-12);
    }
}
