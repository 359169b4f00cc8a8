//! Deterministic top-k selection shared by the models and the recommender

/// Rank `scores` descending and keep the first `k`
///
/// Equal scores are ordered by smaller index first. `k` is clamped to the
/// number of scores.
pub(crate) fn top_k(scores: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(k);
    ranked
}
