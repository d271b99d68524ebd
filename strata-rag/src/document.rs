//! Data types for the chunk hierarchy and retrieval results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sequence index of a [`ParentBlock`] within one chunking pass.
pub type ParentId = usize;

/// A large unit of context returned to the caller when one of its children matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParentBlock {
    /// Position of this block in the document, starting at zero.
    pub id: ParentId,
    /// The block's words joined by single spaces.
    pub text: String,
    /// Overlapping windows over `text`, in document order.
    pub children: Vec<ChildChunk>,
}

impl ParentBlock {
    /// Number of whitespace-separated words in the block.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// A sliding window over a parent's words, used only for matching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChildChunk {
    /// A contiguous word slice of the owning parent, joined by single spaces.
    pub text: String,
    /// The owning [`ParentBlock::id`].
    pub parent_id: ParentId,
}

/// A child chunk paired with its relevance to a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredCandidate<'a> {
    /// The scored child.
    pub chunk: &'a ChildChunk,
    /// Index of the child across the whole document.
    pub position: usize,
    /// Relevance score (higher is more relevant).
    pub score: i32,
}

/// A parent block selected for a query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalResult {
    /// Score of the best child that resolved to this parent.
    pub relevance_score: i32,
    /// The parent's full text, not the matched child's.
    pub chunk_text: String,
    /// The parent this result was resolved from.
    pub parent_id: ParentId,
}

/// How child chunks are scored against a query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    /// Similarity between provider-generated embeddings.
    #[default]
    Embedding,
    /// Whole-word keyword counts plus a positional bonus.
    Lexical,
}

impl fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedding => f.write_str("embedding"),
            Self::Lexical => f.write_str("lexical"),
        }
    }
}
