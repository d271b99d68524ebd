//! Keyword-overlap scoring.

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::config::LexicalConfig;

/// Lowercase the query and keep whitespace-separated words of at least
/// `min_len` characters, with leading and trailing punctuation removed.
///
/// Repeated words are kept, so they count once per repetition.
pub fn tokenize_query(query: &str, min_len: usize) -> Vec<String> {
    query
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|word| word.chars().count() >= min_len)
        .collect()
}

/// Scores text by whole-word, case-insensitive occurrences of query terms.
///
/// A child's score is `occurrences * keyword_weight` plus
/// `max(0, positional_bonus - position)`, clamped to `[0, max_score]`.
#[derive(Debug, Clone)]
pub struct LexicalScorer {
    config: LexicalConfig,
    terms: Vec<String>,
    patterns: Vec<Regex>,
}

impl LexicalScorer {
    /// Prepare a scorer for `query`.
    pub fn new(query: &str, config: LexicalConfig) -> Self {
        let terms = tokenize_query(query, config.min_term_len);
        let patterns = terms
            .iter()
            .filter_map(|term| {
                RegexBuilder::new(&format!(r"\b{}\b", regex::escape(term)))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| {
                        warn!(term_len = term.len(), error = %e, "dropping query term");
                    })
                    .ok()
            })
            .collect();
        Self { config, terms, patterns }
    }

    /// The query terms being matched.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Count whole-word matches of every term in `text`.
    pub fn matches(&self, text: &str) -> usize {
        self.patterns.iter().map(|pattern| pattern.find_iter(text).count()).sum()
    }

    /// Score `text` found at `position` in document order.
    pub fn score(&self, text: &str, position: usize) -> i32 {
        let LexicalConfig { keyword_weight, positional_bonus, max_score, .. } = self.config;

        let keyword = (self.matches(text) as i64).saturating_mul(i64::from(keyword_weight));
        let bonus = (i64::from(positional_bonus) - position as i64).max(0);

        keyword.saturating_add(bonus).clamp(0, i64::from(max_score.max(0))) as i32
    }
}
