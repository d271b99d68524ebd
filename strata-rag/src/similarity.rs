//! Vector similarity measures used in embedding mode.
//!
//! Every function rejects vectors of unequal length with
//! [`RagError::DimensionMismatch`]. [`SimilarityMetric`] selects one of them
//! and converts the result to an integer percentage score.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

fn check_dimensions(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(RagError::DimensionMismatch { expected: a.len(), actual: b.len() });
    }
    Ok(())
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in `[-1, 1]`, or 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dimensions(a, b)?;
    let norm_a = norm(a);
    let norm_b = norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot(a, b) / (norm_a * norm_b))
}

/// Euclidean (L2) distance mapped to a similarity in `(0, 1]`.
///
/// Computed as `exp(-distance / sqrt(n))`, so identical vectors score 1.0.
pub fn euclidean_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dimensions(a, b)?;
    if a.is_empty() {
        return Ok(0.0);
    }
    let distance = a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt();
    Ok((-distance / (a.len() as f32).sqrt()).exp())
}

/// Manhattan (L1) distance mapped to a similarity in `(0, 1]`.
///
/// Computed as `exp(-distance / n)`.
pub fn manhattan_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dimensions(a, b)?;
    if a.is_empty() {
        return Ok(0.0);
    }
    let distance: f32 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum();
    Ok((-distance / a.len() as f32).exp())
}

/// Raw inner product. Equals cosine similarity for unit-length vectors.
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dimensions(a, b)?;
    Ok(dot(a, b))
}

/// Relative weights for [`hybrid_similarity`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HybridWeights {
    pub cosine: f32,
    pub euclidean: f32,
    pub manhattan: f32,
    pub dot_product: f32,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self { cosine: 0.6, euclidean: 0.2, manhattan: 0.1, dot_product: 0.1 }
    }
}

/// Weighted blend of cosine, Euclidean, Manhattan and dot-product similarity.
///
/// The dot product is squashed into `(0, 1)` with `1 / (1 + exp(-dot / 10))`
/// before weighting.
pub fn hybrid_similarity(a: &[f32], b: &[f32], weights: &HybridWeights) -> Result<f32> {
    let cosine = cosine_similarity(a, b)?;
    let euclidean = euclidean_similarity(a, b)?;
    let manhattan = manhattan_similarity(a, b)?;
    let squashed_dot = 1.0 / (1.0 + (-dot(a, b) / 10.0).exp());

    Ok(weights.cosine * cosine
        + weights.euclidean * euclidean
        + weights.manhattan * manhattan
        + weights.dot_product * squashed_dot)
}

/// The similarity measure applied between query and child embeddings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    #[default]
    Cosine,
    Euclidean,
    Manhattan,
    DotProduct,
    Hybrid(HybridWeights),
}

impl SimilarityMetric {
    /// Compute the raw similarity between `a` and `b`.
    pub fn similarity(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        match self {
            Self::Cosine => cosine_similarity(a, b),
            Self::Euclidean => euclidean_similarity(a, b),
            Self::Manhattan => manhattan_similarity(a, b),
            Self::DotProduct => dot_product(a, b),
            Self::Hybrid(weights) => hybrid_similarity(a, b, weights),
        }
    }

    /// Compute `round(similarity * 100)`.
    pub fn score(&self, a: &[f32], b: &[f32]) -> Result<i32> {
        Ok((self.similarity(a, b)? * 100.0).round() as i32)
    }
}
