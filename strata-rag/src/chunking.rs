//! Two-level document chunking.
//!
//! [`HierarchicalChunker`] groups paragraphs into parent blocks of roughly
//! `parent_size` words and slides an overlapping window of `child_size` words
//! across each parent. Children are what gets scored; parents are what gets
//! returned.

use tracing::info;

use crate::config::ChunkingConfig;
use crate::document::{ChildChunk, ParentBlock};
use crate::error::Result;

/// Splits text into [`ParentBlock`]s, each carrying its [`ChildChunk`]s.
///
/// # Example
///
/// ```rust,ignore
/// use strata_rag::{ChunkingConfig, HierarchicalChunker};
///
/// let chunker = HierarchicalChunker::new(ChunkingConfig::default())?;
/// let parents = chunker.chunk(&document_text);
/// ```
#[derive(Debug, Clone)]
pub struct HierarchicalChunker {
    config: ChunkingConfig,
}

impl HierarchicalChunker {
    /// Create a chunker from a config, validating it first.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`](crate::RagError::InvalidConfig) if
    /// a size is zero or `child_overlap >= child_size`.
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Return the chunker's configuration.
    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Split `text` into parent blocks.
    ///
    /// Paragraphs are separated by one or more blank lines. Paragraph words
    /// accumulate until the buffer holds at least `parent_size` words or the
    /// last paragraph is consumed, at which point the buffer becomes a
    /// parent. Returns an empty `Vec` for empty or whitespace-only text.
    pub fn chunk(&self, text: &str) -> Vec<ParentBlock> {
        let paragraphs = split_paragraphs(text);
        let last = paragraphs.len().saturating_sub(1);

        let mut parents = Vec::new();
        let mut buffer: Vec<&str> = Vec::new();

        for (i, words) in paragraphs.into_iter().enumerate() {
            buffer.extend(words);
            if buffer.len() >= self.config.parent_size || i == last {
                let id = parents.len();
                parents.push(ParentBlock {
                    id,
                    text: buffer.join(" "),
                    children: self.children(id, &buffer),
                });
                buffer.clear();
            }
        }

        info!(
            parent_count = parents.len(),
            child_count = parents.iter().map(|p| p.children.len()).sum::<usize>(),
            "chunked document"
        );

        parents
    }

    fn children(&self, parent_id: usize, words: &[&str]) -> Vec<ChildChunk> {
        let ChunkingConfig { child_size, min_child_chars, .. } = self.config;

        (0..words.len())
            .step_by(self.config.step())
            .map(|start| words[start..(start + child_size).min(words.len())].join(" "))
            .filter(|text| text.chars().count() > min_child_chars)
            .map(|text| ChildChunk { text, parent_id })
            .collect()
    }
}

/// Chunk `text` with explicit word sizes and the default minimum child length.
///
/// # Errors
///
/// Returns [`RagError::InvalidConfig`](crate::RagError::InvalidConfig) if
/// `child_overlap >= child_size` or any size is zero.
pub fn chunk(
    text: &str,
    parent_size: usize,
    child_size: usize,
    child_overlap: usize,
) -> Result<Vec<ParentBlock>> {
    let config = ChunkingConfig::new(parent_size, child_size, child_overlap)?;
    Ok(HierarchicalChunker { config }.chunk(text))
}

/// Split text at blank lines into the words of each non-empty paragraph.
fn split_paragraphs(text: &str) -> Vec<Vec<&str>> {
    let mut paragraphs = Vec::new();
    let mut current = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.extend(line.split_whitespace());
        }
    }

    if !current.is_empty() {
        paragraphs.push(current);
    }

    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RagError;

    fn words(prefix: &str, n: usize) -> String {
        (0..n).map(|i| format!("{prefix}{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn empty_and_blank_text_yield_nothing() {
        let chunker = HierarchicalChunker::new(ChunkingConfig::default()).unwrap();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n\n\t\n  ").is_empty());
    }

    #[test]
    fn short_document_is_one_parent() {
        let text = format!("{}\n\n{}", words("alpha", 40), words("beta", 40));
        let parents = chunk(&text, 1000, 200, 50).unwrap();
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].id, 0);
        assert_eq!(parents[0].word_count(), 80);
        assert_eq!(parents[0].children.len(), 1);
    }

    #[test]
    fn text_without_separators_is_a_single_paragraph() {
        let text = words("word", 300).replace(' ', "\n");
        let parents = chunk(&text, 1000, 200, 50).unwrap();
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].word_count(), 300);
    }

    #[test]
    fn long_then_short_paragraph_gives_two_parents() {
        let text = format!("{}\n\n\n{}", words("long", 1500), words("tail", 100));
        let parents = chunk(&text, 1000, 200, 50).unwrap();

        assert_eq!(parents.len(), 2);
        assert_eq!(parents[0].word_count(), 1500);
        assert_eq!(parents[1].word_count(), 100);
        assert!(parents[1].text.starts_with("tail0 "));
        assert!(parents[1].children.iter().all(|c| c.parent_id == 1));
    }

    #[test]
    fn small_paragraphs_accumulate_until_parent_size() {
        let text = (0..6).map(|p| words(&format!("p{p}w"), 30)).collect::<Vec<_>>().join("\n\n");
        let parents = chunk(&text, 60, 20, 5).unwrap();

        assert_eq!(parents.len(), 3);
        assert!(parents.iter().all(|p| p.word_count() == 60));
    }

    #[test]
    fn trailing_blank_lines_do_not_drop_the_last_parent() {
        let text = format!("{}\n\n{}\n\n\n", words("a", 30), words("b", 30));
        let parents = chunk(&text, 1000, 200, 50).unwrap();
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].word_count(), 60);
    }

    #[test]
    fn children_slide_with_overlap() {
        let text = words("token", 500);
        let parents = chunk(&text, 1000, 200, 50).unwrap();
        let children = &parents[0].children;

        // Windows start at 0, 150, 300, 450.
        assert_eq!(children.len(), 4);
        assert!(children[0].text.starts_with("token0 "));
        assert!(children[1].text.starts_with("token150 "));
        assert!(children[2].text.starts_with("token300 "));
        assert!(children[3].text.starts_with("token450 "));
        assert!(children[0].text.ends_with(" token199"));
        assert_eq!(children[3].text.split(' ').count(), 50);
    }

    #[test]
    fn short_trailing_windows_are_discarded() {
        // 7 words of 8 chars each: the first window is long, the tail is
        // "wwwwww05 wwwwww06" (17 chars) and falls under the 50-char floor.
        let text = (0..7).map(|i| format!("wwwwww{i:02}")).collect::<Vec<_>>().join(" ");
        let parents = chunk(&text, 1000, 6, 1).unwrap();
        assert_eq!(parents[0].children.len(), 1);
    }

    #[test]
    fn child_must_exceed_fifty_chars() {
        // Two disjoint windows of five words: 46 + 4 spaces = 50 chars,
        // then 47 + 4 spaces = 51 chars.
        let first = ["aaaaaaaaaa", "bbbbbbbbbb", "cccccccccc", "dddddddddd", "eeeeee"];
        let second = ["ffffffffff", "gggggggggg", "hhhhhhhhhh", "iiiiiiiiii", "jjjjjjj"];
        let text = format!("{} {}", first.join(" "), second.join(" "));
        assert_eq!(first.join(" ").len(), 50);
        assert_eq!(second.join(" ").len(), 51);

        let parents = chunk(&text, 1000, 5, 0).unwrap();
        let children = &parents[0].children;
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].text, second.join(" "));
    }

    #[test]
    fn tiny_document_has_a_parent_but_no_children() {
        let parents = chunk("just a few words", 1000, 200, 50).unwrap();
        assert_eq!(parents.len(), 1);
        assert!(parents[0].children.is_empty());
    }

    #[test]
    fn invalid_overlap_is_rejected() {
        let err = chunk("text", 1000, 50, 50).unwrap_err();
        assert!(matches!(err, RagError::InvalidConfig(_)));
        assert!(HierarchicalChunker::new(ChunkingConfig { child_overlap: 300, ..Default::default() })
            .is_err());
    }
}
