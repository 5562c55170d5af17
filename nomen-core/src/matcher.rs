//! Cosine-similarity matcher over the enrolled voice set.
//!
//! ## Algorithm
//!
//! 1. Empty candidate set → `{ voice_id: None, score: 0.0 }`, not an error.
//! 2. Score the query against every candidate with cosine similarity.
//! 3. Keep the strictly greatest score, so a tied score leaves the earlier
//!    candidate in place — first in iteration order wins.
//! 4. Accept when the best score reaches the threshold (`>=`); a rejection
//!    still carries the true best score so thresholds can be tuned from
//!    observed traffic.

use serde::Serialize;
use tracing::debug;

use crate::embedding::Embedding;
use crate::error::{NomenError, Result};
use crate::store::VoiceRecord;

/// Outcome of matching a query embedding against the enrolled set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// Best-matching identity, or `None` when the store is empty or the
    /// best score fell below the acceptance threshold.
    pub voice_id: Option<String>,
    /// Best similarity observed, reported even on rejection.
    pub score: f32,
}

/// Cosine similarity of two equal-length vectors, in [-1, 1].
///
/// Accumulates in f64 and clamps the result to absorb floating point error.
///
/// # Errors
/// `Extraction` on a length mismatch or a zero-norm operand. Both indicate
/// an encoder contract violation, and failing fast beats propagating `NaN`
/// into match decisions.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(NomenError::Extraction(format!(
            "cannot compare embeddings of dimension {} and {}",
            a.len(),
            b.len()
        )));
    }

    let mut dot: f64 = 0.0;
    let mut norm_a: f64 = 0.0;
    let mut norm_b: f64 = 0.0;

    for i in 0..a.len() {
        let ai = a[i] as f64;
        let bi = b[i] as f64;
        dot += ai * bi;
        norm_a += ai * ai;
        norm_b += bi * bi;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(NomenError::Extraction(
            "cosine similarity of a zero-norm vector".into(),
        ));
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    Ok(similarity.clamp(-1.0, 1.0) as f32)
}

/// Score `query` against every candidate and apply the acceptance threshold.
pub fn best_match(
    query: &Embedding,
    candidates: &[VoiceRecord],
    threshold: f32,
) -> Result<MatchResult> {
    if candidates.is_empty() {
        return Ok(MatchResult {
            voice_id: None,
            score: 0.0,
        });
    }

    let mut best_idx = 0usize;
    let mut best_score = cosine_similarity(query.as_slice(), candidates[0].embedding.as_slice())?;
    for (idx, record) in candidates.iter().enumerate().skip(1) {
        let score = cosine_similarity(query.as_slice(), record.embedding.as_slice())?;
        if score > best_score {
            best_score = score;
            best_idx = idx;
        }
    }

    let accepted = best_score >= threshold;
    debug!(
        best = %candidates[best_idx].voice_id,
        score = best_score,
        accepted,
        candidates = candidates.len(),
        "scored query"
    );

    Ok(MatchResult {
        voice_id: accepted.then(|| candidates[best_idx].voice_id.clone()),
        score: best_score,
    })
}
