use crate::embedding::cosine_similarity;
use crate::embedding::l2_norm;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredIdx {
    pub idx: usize,
    pub score: f32,
}

/// Return indices of the top_k most similar vectors (cosine similarity),
/// in descending score order.
///
/// Equal scores keep haystack order: the sort is stable, so the earlier
/// vector always ranks first. A zero-magnitude query has no defined cosine
/// and yields nothing; zero-magnitude haystack vectors score 0.
pub fn top_k_cosine<V: AsRef<[f32]>>(haystack: &[V], query: &[f32], top_k: usize) -> Vec<ScoredIdx> {
    if top_k == 0 || haystack.is_empty() { return Vec::new(); }
    if l2_norm(query) == 0.0 { return Vec::new(); }
    let mut scored: Vec<ScoredIdx> = haystack
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let score = cosine_similarity(v.as_ref(), query);
            ScoredIdx { idx: i, score: if score.is_nan() { 0.0 } else { score } }
        })
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(top_k);
    scored
}
