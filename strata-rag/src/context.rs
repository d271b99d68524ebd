//! Hand-off of selected passages to an external answer-synthesis call.
//!
//! The retriever's job ends at [`RetrievalResult`]s. This module turns them
//! into prompt context for a [`TextGenerator`] and wraps the generated answer
//! in one canonical [`RagAnswer`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::document::{RetrievalResult, ScoringMode};
use crate::error::Result;
use crate::retriever::RetrievalOutcome;

/// An external text-generation backend, typically a hosted LLM.
///
/// Implementations should report failures as
/// [`RagError::SynthesisError`](crate::RagError::SynthesisError).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Render results as numbered context lines: `"{rank}. [{score}%] {text}"`.
///
/// Ranks start at 1 and follow selection order.
pub fn format_context(results: &[RetrievalResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. [{}%] {}", i + 1, r.relevance_score, r.chunk_text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the prompt sent to the generator for `query`.
pub fn build_synthesis_prompt(query: &str, results: &[RetrievalResult]) -> String {
    format!(
        "You are a research assistant. Answer the question using only the numbered \
         context passages below. Cite passages by number in square brackets, for \
         example [1]. If the passages do not contain the answer, say so.\n\n\
         Context:\n{context}\n\n\
         Question: {query}\n\n\
         Answer:",
        context = format_context(results),
    )
}

/// A synthesized answer together with the passages it was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RagAnswer {
    /// The generated answer. Empty when no passages were retrieved.
    pub answer: String,
    /// The passages given to the generator, best first.
    pub ranked_passages: Vec<RetrievalResult>,
    /// How the passages were scored.
    pub mode: ScoringMode,
}

/// Ask `generator` to answer `query` from a retrieval outcome.
///
/// When the outcome has no results the generator is not called and the
/// answer is empty.
///
/// # Errors
///
/// Propagates the generator's error.
pub async fn synthesize_answer(
    generator: &dyn TextGenerator,
    query: &str,
    outcome: RetrievalOutcome,
) -> Result<RagAnswer> {
    let RetrievalOutcome { results, mode, .. } = outcome;

    if results.is_empty() {
        info!(%mode, "no passages retrieved, skipping synthesis");
        return Ok(RagAnswer { answer: String::new(), ranked_passages: results, mode });
    }

    let prompt = build_synthesis_prompt(query, &results);
    let answer = generator.generate(&prompt).await.map_err(|e| {
        error!(error = %e, "answer synthesis failed");
        e
    })?;

    info!(%mode, passage_count = results.len(), answer_len = answer.len(), "synthesized answer");

    Ok(RagAnswer { answer, ranked_passages: results, mode })
}
