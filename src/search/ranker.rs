//! Brute-force cosine ranking over stored embeddings.

use crate::error::{RagError, Result};

use super::store::ScoredId;

/// Cosine of the angle between `a` and `b`.
///
/// Returns 0.0 when either vector has zero magnitude. Callers are expected to
/// have checked that the lengths agree; [`rank`] does.
///
/// Sums run in `f64` so squares of very small or very large components
/// neither underflow to zero nor overflow to infinity.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        (dot / denom) as f32
    }
}

/// Score every candidate against `query` and keep the `top_k` best.
///
/// Candidates must be supplied in insertion order: the sort is stable, so
/// equal scores keep that order. The first candidate whose length differs
/// from the query aborts the whole ranking.
pub fn rank<'a, I>(query: &[f32], candidates: I, top_k: usize) -> Result<Vec<ScoredId>>
where
    I: IntoIterator<Item = (&'a str, &'a [f32])>,
{
    if top_k == 0 {
        return Ok(Vec::new());
    }

    let mut scored = Vec::new();
    for (id, embedding) in candidates {
        if embedding.len() != query.len() {
            return Err(RagError::DimensionMismatch {
                id: id.to_string(),
                expected: embedding.len(),
                actual: query.len(),
            });
        }
        scored.push(ScoredId::new(id, cosine_similarity(query, embedding)));
    }

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(top_k);

    Ok(scored)
}
