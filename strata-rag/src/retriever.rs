//! Retrieval orchestrator.
//!
//! The [`Retriever`] scores every child chunk of a document against a query,
//! either through an [`EmbeddingProvider`] or lexically, and resolves the
//! winners to distinct parent blocks.
//!
//! # Example
//!
//! ```rust,ignore
//! use strata_rag::{Retriever, RetrievalConfig, ScoringMode};
//!
//! let retriever = Retriever::builder()
//!     .config(RetrievalConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .build()?;
//!
//! let parents = retriever.chunk(&document_text);
//! let results = retriever.retrieve(&parents, "search query", 5, ScoringMode::Embedding).await?;
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::chunking::HierarchicalChunker;
use crate::config::RetrievalConfig;
use crate::document::{ChildChunk, ParentBlock, RetrievalResult, ScoredCandidate, ScoringMode};
use crate::embedding::{EmbeddingProvider, embed_all, embed_with_timeout};
use crate::error::{RagError, Result};
use crate::lexical::LexicalScorer;
use crate::selector::select_parents;

/// Results of [`Retriever::retrieve_with_fallback`], tagged with the mode
/// that actually produced them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalOutcome {
    /// Selected parent blocks, best first.
    pub results: Vec<RetrievalResult>,
    /// The scoring mode that produced `results`.
    pub mode: ScoringMode,
    /// Why embedding mode was abandoned, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

/// Scores child chunks against a query and selects parent blocks.
///
/// A retriever holds no per-request state; one instance can serve
/// concurrent calls. Construct one via [`Retriever::builder()`].
pub struct Retriever {
    config: RetrievalConfig,
    chunker: HierarchicalChunker,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
}

impl Retriever {
    /// Create a new [`RetrieverBuilder`].
    pub fn builder() -> RetrieverBuilder {
        RetrieverBuilder::default()
    }

    /// Return a reference to the retrieval configuration.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Return the embedding provider, if one is configured.
    pub fn embedding_provider(&self) -> Option<&Arc<dyn EmbeddingProvider>> {
        self.embedding_provider.as_ref()
    }

    /// Split a document using the configured chunk sizes.
    pub fn chunk(&self, text: &str) -> Vec<ParentBlock> {
        self.chunker.chunk(text)
    }

    /// Score every child of `parents` against `query`.
    ///
    /// Candidates are returned in document order. An empty query or a
    /// hierarchy without children yields no candidates.
    ///
    /// # Errors
    ///
    /// In embedding mode, returns [`RagError::EmbeddingProviderUnavailable`]
    /// if no provider is configured or any embedding call fails or times out,
    /// and [`RagError::DimensionMismatch`] if no child embedding matches the
    /// query's dimensionality. Children with mismatched embeddings are
    /// otherwise skipped.
    pub async fn score<'a>(
        &self,
        parents: &'a [ParentBlock],
        query: &str,
        mode: ScoringMode,
    ) -> Result<Vec<ScoredCandidate<'a>>> {
        if query.trim().is_empty() {
            debug!("empty query, nothing to score");
            return Ok(Vec::new());
        }

        let children: Vec<&ChildChunk> = parents.iter().flat_map(|p| &p.children).collect();
        if children.is_empty() {
            debug!(parent_count = parents.len(), "no child chunks to score");
            return Ok(Vec::new());
        }

        match mode {
            ScoringMode::Lexical => Ok(self.score_lexical(&children, query)),
            ScoringMode::Embedding => self.score_embedding(&children, query).await,
        }
    }

    fn score_lexical<'a>(
        &self,
        children: &[&'a ChildChunk],
        query: &str,
    ) -> Vec<ScoredCandidate<'a>> {
        let scorer = LexicalScorer::new(query, self.config.lexical);
        debug!(terms = ?scorer.terms(), child_count = children.len(), "lexical scoring");

        children
            .iter()
            .copied()
            .enumerate()
            .map(|(position, chunk)| ScoredCandidate {
                chunk,
                position,
                score: scorer.score(&chunk.text, position),
            })
            .collect()
    }

    async fn score_embedding<'a>(
        &self,
        children: &[&'a ChildChunk],
        query: &str,
    ) -> Result<Vec<ScoredCandidate<'a>>> {
        let provider = self.embedding_provider.as_deref().ok_or_else(|| {
            RagError::provider_unavailable("none", "no embedding provider configured")
        })?;
        let timeout = self.config.embedding_timeout;

        let query_embedding = embed_with_timeout(provider, query, timeout).await.map_err(|e| {
            error!(provider = provider.name(), error = %e, "query embedding failed");
            e
        })?;

        let texts: Vec<&str> = children.iter().map(|c| c.text.as_str()).collect();
        let embeddings = embed_all(provider, &texts, self.config.embedding_concurrency, timeout)
            .await
            .map_err(|e| {
                error!(provider = provider.name(), error = %e, "child embedding failed");
                e
            })?;

        let mut candidates = Vec::with_capacity(children.len());
        let mut first_mismatch = None;

        let scored = children.iter().copied().zip(&embeddings).enumerate();
        for (position, (chunk, embedding)) in scored {
            match self.config.metric.score(&query_embedding, embedding) {
                Ok(score) => candidates.push(ScoredCandidate { chunk, position, score }),
                Err(e @ RagError::DimensionMismatch { .. }) => {
                    warn!(provider = provider.name(), position, error = %e, "skipping child");
                    if first_mismatch.is_none() {
                        first_mismatch = Some(e);
                    }
                }
                Err(e) => return Err(e),
            }
        }

        match first_mismatch {
            Some(e) if candidates.is_empty() => Err(e),
            _ => Ok(candidates),
        }
    }

    /// Retrieve up to `top_k` distinct parent blocks for `query`.
    ///
    /// Results carry the parent's full text and the score of its best child,
    /// ordered by descending score. Fewer than `top_k` results are returned
    /// when the document has fewer matching parents.
    ///
    /// In embedding mode a child whose vector has the wrong dimension is
    /// logged at `warn` and left out of the ranking, so its parent can only
    /// win through its other children.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`score`](Retriever::score). The caller
    /// decides whether to fall back; see
    /// [`retrieve_with_fallback`](Retriever::retrieve_with_fallback).
    pub async fn retrieve(
        &self,
        parents: &[ParentBlock],
        query: &str,
        top_k: usize,
        mode: ScoringMode,
    ) -> Result<Vec<RetrievalResult>> {
        let candidates = self.score(parents, query, mode).await?;
        let candidate_count = candidates.len();
        let results = select_parents(parents, candidates, top_k, self.config.candidate_multiplier);

        info!(
            %mode,
            parent_count = parents.len(),
            candidate_count,
            top_k,
            result_count = results.len(),
            "retrieval completed"
        );

        Ok(results)
    }

    /// Chunk `text` and retrieve the configured `top_k` parents for `query`.
    ///
    /// # Errors
    ///
    /// See [`retrieve`](Retriever::retrieve).
    pub async fn retrieve_document(
        &self,
        text: &str,
        query: &str,
        mode: ScoringMode,
    ) -> Result<Vec<RetrievalResult>> {
        let parents = self.chunk(text);
        self.retrieve(&parents, query, self.config.top_k, mode).await
    }

    /// Retrieve in embedding mode, switching to lexical scoring when the
    /// embedding provider is unavailable.
    ///
    /// # Errors
    ///
    /// Returns non-recoverable errors (such as
    /// [`RagError::DimensionMismatch`]) unchanged.
    pub async fn retrieve_with_fallback(
        &self,
        parents: &[ParentBlock],
        query: &str,
        top_k: usize,
    ) -> Result<RetrievalOutcome> {
        match self.retrieve(parents, query, top_k, ScoringMode::Embedding).await {
            Ok(results) => Ok(RetrievalOutcome {
                results,
                mode: ScoringMode::Embedding,
                fallback_reason: None,
            }),
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "embedding retrieval failed, falling back to lexical scoring");
                let results = self.retrieve(parents, query, top_k, ScoringMode::Lexical).await?;
                Ok(RetrievalOutcome {
                    results,
                    mode: ScoringMode::Lexical,
                    fallback_reason: Some(e.to_string()),
                })
            }
            Err(e) => Err(e),
        }
    }
}

/// Builder for constructing a [`Retriever`].
///
/// The config defaults to [`RetrievalConfig::default()`]. The embedding
/// provider is optional; without one, embedding mode fails with
/// [`RagError::EmbeddingProviderUnavailable`] and only lexical mode works.
#[derive(Default)]
pub struct RetrieverBuilder {
    config: Option<RetrievalConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
}

impl RetrieverBuilder {
    /// Set the retrieval configuration.
    pub fn config(mut self, config: RetrievalConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Build the [`Retriever`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] if the config fails validation.
    pub fn build(self) -> Result<Retriever> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let chunker = HierarchicalChunker::new(config.chunking)?;

        Ok(Retriever { config, chunker, embedding_provider: self.embedding_provider })
    }
}
