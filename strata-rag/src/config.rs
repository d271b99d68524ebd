//! Configuration for chunking and retrieval.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::similarity::SimilarityMetric;

/// Word-count parameters for the parent/child hierarchy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target size of a parent block in words.
    pub parent_size: usize,
    /// Size of each child window in words.
    pub child_size: usize,
    /// Number of words shared by consecutive child windows.
    pub child_overlap: usize,
    /// Child windows with this many characters or fewer are discarded.
    pub min_child_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { parent_size: 1000, child_size: 200, child_overlap: 50, min_child_chars: 50 }
    }
}

impl ChunkingConfig {
    /// Create a validated chunking config with the default `min_child_chars`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] under the same conditions as
    /// [`validate`](ChunkingConfig::validate).
    pub fn new(parent_size: usize, child_size: usize, child_overlap: usize) -> Result<Self> {
        let config = Self { parent_size, child_size, child_overlap, ..Self::default() };
        config.validate()?;
        Ok(config)
    }

    /// Check that the sliding window can make progress.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] if:
    /// - `parent_size == 0` or `child_size == 0`
    /// - `child_overlap >= child_size`
    pub fn validate(&self) -> Result<()> {
        if self.parent_size == 0 {
            return Err(RagError::InvalidConfig("parent_size must be greater than zero".into()));
        }
        if self.child_size == 0 {
            return Err(RagError::InvalidConfig("child_size must be greater than zero".into()));
        }
        if self.child_overlap >= self.child_size {
            return Err(RagError::InvalidConfig(format!(
                "child_overlap ({}) must be less than child_size ({})",
                self.child_overlap, self.child_size
            )));
        }
        Ok(())
    }

    /// Distance in words between the starts of consecutive child windows.
    pub fn step(&self) -> usize {
        self.child_size - self.child_overlap
    }
}

/// Weights for keyword-overlap scoring.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LexicalConfig {
    /// Points awarded per whole-word occurrence of a query term.
    pub keyword_weight: i32,
    /// Bonus for the first child; decreases by one per child index, floored at zero.
    pub positional_bonus: i32,
    /// Query words shorter than this many characters are ignored.
    pub min_term_len: usize,
    /// Upper clamp for the total score.
    pub max_score: i32,
}

impl Default for LexicalConfig {
    fn default() -> Self {
        Self { keyword_weight: 10, positional_bonus: 20, min_term_len: 3, max_score: 100 }
    }
}

/// Configuration for a [`Retriever`](crate::Retriever).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunk sizing.
    pub chunking: ChunkingConfig,
    /// Lexical scoring weights.
    pub lexical: LexicalConfig,
    /// Maximum number of distinct parent blocks to return.
    pub top_k: usize,
    /// Candidates considered during selection, as a multiple of `top_k`.
    pub candidate_multiplier: usize,
    /// Vector similarity used in embedding mode.
    pub metric: SimilarityMetric,
    /// Maximum number of embedding calls in flight at once.
    pub embedding_concurrency: usize,
    /// Per-call timeout for embedding requests. `None` waits indefinitely.
    #[serde(with = "duration_ms")]
    pub embedding_timeout: Option<Duration>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            lexical: LexicalConfig::default(),
            top_k: 5,
            candidate_multiplier: 2,
            metric: SimilarityMetric::Cosine,
            embedding_concurrency: 8,
            embedding_timeout: None,
        }
    }
}

impl RetrievalConfig {
    /// Create a new builder for constructing a [`RetrievalConfig`].
    pub fn builder() -> RetrievalConfigBuilder {
        RetrievalConfigBuilder::default()
    }

    /// Validate every nested parameter.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] if the chunking parameters are
    /// invalid, or if `top_k`, `candidate_multiplier` or
    /// `embedding_concurrency` is zero.
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.top_k == 0 {
            return Err(RagError::InvalidConfig("top_k must be greater than zero".into()));
        }
        if self.candidate_multiplier == 0 {
            return Err(RagError::InvalidConfig(
                "candidate_multiplier must be at least one".into(),
            ));
        }
        if self.embedding_concurrency == 0 {
            return Err(RagError::InvalidConfig(
                "embedding_concurrency must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RetrievalConfig`].
#[derive(Debug, Clone, Default)]
pub struct RetrievalConfigBuilder {
    config: RetrievalConfig,
}

impl RetrievalConfigBuilder {
    /// Set the target parent block size in words.
    pub fn parent_size(mut self, words: usize) -> Self {
        self.config.chunking.parent_size = words;
        self
    }

    /// Set the child window size in words.
    pub fn child_size(mut self, words: usize) -> Self {
        self.config.chunking.child_size = words;
        self
    }

    /// Set the overlap between consecutive child windows in words.
    pub fn child_overlap(mut self, words: usize) -> Self {
        self.config.chunking.child_overlap = words;
        self
    }

    /// Set the character length at or below which child windows are dropped.
    pub fn min_child_chars(mut self, chars: usize) -> Self {
        self.config.chunking.min_child_chars = chars;
        self
    }

    /// Replace the lexical scoring weights.
    pub fn lexical(mut self, lexical: LexicalConfig) -> Self {
        self.config.lexical = lexical;
        self
    }

    /// Set the default number of parent blocks to return.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set how many candidates per requested result are considered.
    pub fn candidate_multiplier(mut self, multiplier: usize) -> Self {
        self.config.candidate_multiplier = multiplier;
        self
    }

    /// Set the vector similarity used in embedding mode.
    pub fn metric(mut self, metric: SimilarityMetric) -> Self {
        self.config.metric = metric;
        self
    }

    /// Set the maximum number of concurrent embedding calls.
    pub fn embedding_concurrency(mut self, n: usize) -> Self {
        self.config.embedding_concurrency = n;
        self
    }

    /// Set the per-call embedding timeout.
    pub fn embedding_timeout(mut self, timeout: Duration) -> Self {
        self.config.embedding_timeout = Some(timeout);
        self
    }

    /// Build the [`RetrievalConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] as described in
    /// [`RetrievalConfig::validate`].
    pub fn build(self) -> Result<RetrievalConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Serializes `Option<Duration>` as an optional integer number of milliseconds.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => {
                let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
                serializer.serialize_some(&millis)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
