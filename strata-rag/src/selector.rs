//! Maps winning child chunks back to distinct parent blocks.

use std::collections::{HashMap, HashSet};

use crate::document::{ParentBlock, ParentId, RetrievalResult, ScoredCandidate};

/// Select up to `top_k` distinct parents from scored children.
///
/// Candidates are sorted by descending score (ties keep document order) and
/// the best `top_k * candidate_multiplier` are walked in order. Each child
/// whose parent has not been emitted yet produces one [`RetrievalResult`]
/// carrying the child's score and the parent's full text. Results are
/// therefore ordered by descending score and never repeat a parent.
pub fn select_parents(
    parents: &[ParentBlock],
    mut candidates: Vec<ScoredCandidate<'_>>,
    top_k: usize,
    candidate_multiplier: usize,
) -> Vec<RetrievalResult> {
    if top_k == 0 || candidates.is_empty() {
        return Vec::new();
    }

    let by_id: HashMap<ParentId, &ParentBlock> = parents.iter().map(|p| (p.id, p)).collect();

    // `sort_by` is stable, so equal scores stay in document order.
    candidates.sort_by(|a, b| b.score.cmp(&a.score));
    candidates.truncate(top_k.saturating_mul(candidate_multiplier.max(1)));

    let mut seen = HashSet::new();
    let mut results = Vec::with_capacity(top_k.min(candidates.len()));

    for candidate in candidates {
        let parent_id = candidate.chunk.parent_id;
        if seen.contains(&parent_id) {
            continue;
        }
        let Some(parent) = by_id.get(&parent_id) else {
            continue;
        };
        seen.insert(parent_id);
        results.push(RetrievalResult {
            relevance_score: candidate.score,
            chunk_text: parent.text.clone(),
            parent_id,
        });
        if results.len() >= top_k {
            break;
        }
    }

    results
}
