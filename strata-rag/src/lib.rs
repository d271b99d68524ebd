//! # strata-rag
//!
//! Hierarchical retrieval for retrieval-augmented generation.
//!
//! A document is split into large **parent** blocks (the context handed to a
//! language model) and small overlapping **child** windows (what is matched
//! against the query). Children are scored either by embedding similarity or
//! by keyword overlap, and the best children are resolved back to distinct
//! parents.
//!
//! ## Overview
//!
//! - [`HierarchicalChunker`] builds the parent/child hierarchy
//! - [`EmbeddingProvider`] abstracts the embedding backend
//! - [`LexicalScorer`] scores children without a provider
//! - [`Retriever`] scores, sorts, and selects parents
//! - [`format_context`] and [`synthesize_answer`] hand results to a [`TextGenerator`]
//! - [`QueryTransformer`] rewrites queries before retrieval
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `gemini` | [`GeminiEmbeddingProvider`](gemini::GeminiEmbeddingProvider) over the Gemini REST API |
//! | `full` | Enables all optional providers |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use strata_rag::{Retriever, RetrievalConfig, ScoringMode, format_context};
//!
//! let retriever = Retriever::builder()
//!     .config(RetrievalConfig::builder().top_k(3).build()?)
//!     .embedding_provider(Arc::new(my_embedder))
//!     .build()?;
//!
//! let parents = retriever.chunk(&document_text);
//! let outcome = retriever.retrieve_with_fallback(&parents, "What are the benefits?", 3).await?;
//! println!("{}", format_context(&outcome.results));
//! ```

pub mod chunking;
pub mod config;
pub mod context;
pub mod document;
pub mod embedding;
pub mod error;
pub mod lexical;
pub mod query;
pub mod retriever;
pub mod selector;
pub mod similarity;

#[cfg(feature = "gemini")]
pub mod gemini;

pub use chunking::{HierarchicalChunker, chunk};
pub use config::{ChunkingConfig, LexicalConfig, RetrievalConfig, RetrievalConfigBuilder};
pub use context::{
    RagAnswer, TextGenerator, build_synthesis_prompt, format_context, synthesize_answer,
};
pub use document::{
    ChildChunk, ParentBlock, ParentId, RetrievalResult, ScoredCandidate, ScoringMode,
};
pub use embedding::EmbeddingProvider;
pub use error::{ErrorKind, RagError, Result};
pub use lexical::{LexicalScorer, tokenize_query};
pub use query::{
    QueryAnalysis, QueryTransformer, SuggestedTransforms, TransformOptions, TransformedQuery,
    analyze_query,
};
pub use retriever::{RetrievalOutcome, Retriever, RetrieverBuilder};
pub use selector::select_parents;
pub use similarity::{
    HybridWeights, SimilarityMetric, cosine_similarity, dot_product, euclidean_similarity,
    hybrid_similarity, manhattan_similarity,
};
