//! Query analysis and LLM-assisted query rewriting.
//!
//! [`analyze_query`] is a cheap, deterministic classifier that suggests which
//! rewrites are worth paying for. [`QueryTransformer`] performs them through a
//! [`TextGenerator`]; every rewrite falls back to the original query when the
//! generator fails or returns something unusable.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::context::TextGenerator;

const COMPARISON_TERMS: &[&str] = &["vs", "versus", "compare", "difference", "better"];
const MULTI_PART_TERMS: &[&str] = &["and", "also", "additionally", "furthermore"];
const TECHNICAL_TERMS: &[&str] = &["error", "bug", "fix", "implement", "code", "function", "api"];

/// Which rewrites [`analyze_query`] recommends.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SuggestedTransforms {
    pub expansion: bool,
    pub decomposition: bool,
    pub hyde: bool,
    pub step_back: bool,
}

/// Surface features of a query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryAnalysis {
    pub word_count: usize,
    /// Fewer than five words.
    pub is_vague: bool,
    /// Asks for a comparison, has several parts, or runs over fifteen words.
    pub is_complex: bool,
    /// Mentions code, errors or APIs.
    pub is_technical: bool,
    pub suggested: SuggestedTransforms,
}

/// Classify a query by length and vocabulary.
///
/// Vocabulary checks match whole words case-insensitively.
pub fn analyze_query(query: &str) -> QueryAnalysis {
    let word_count = query.split_whitespace().count();
    let words: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    let mentions = |terms: &[&str]| words.iter().any(|w| terms.contains(&w.as_str()));

    let has_comparison = mentions(COMPARISON_TERMS);
    let has_multiple_parts = mentions(MULTI_PART_TERMS);
    let is_technical = mentions(TECHNICAL_TERMS);
    let is_vague = word_count < 5;

    QueryAnalysis {
        word_count,
        is_vague,
        is_complex: has_comparison || has_multiple_parts || word_count > 15,
        is_technical,
        suggested: SuggestedTransforms {
            expansion: is_vague,
            decomposition: has_comparison || has_multiple_parts,
            hyde: !is_technical && word_count > 5,
            step_back: is_technical,
        },
    }
}

/// Which rewrites [`QueryTransformer::transform`] applies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransformOptions {
    pub expansion: bool,
    /// Only applied to queries that [`analyze_query`] marks as complex.
    pub decomposition: bool,
    pub hyde: bool,
    pub step_back: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self { expansion: true, decomposition: false, hyde: false, step_back: false }
    }
}

impl From<SuggestedTransforms> for TransformOptions {
    fn from(s: SuggestedTransforms) -> Self {
        Self {
            expansion: s.expansion,
            decomposition: s.decomposition,
            hyde: s.hyde,
            step_back: s.step_back,
        }
    }
}

/// Every rewrite produced for a query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransformedQuery {
    pub original: String,
    pub expanded: Option<String>,
    pub sub_questions: Option<Vec<String>>,
    pub hypothetical_answer: Option<String>,
    pub step_back: Option<String>,
    /// Queries to run against the retriever, in priority order.
    pub search_queries: Vec<String>,
}

/// Rewrites queries through an external [`TextGenerator`].
pub struct QueryTransformer {
    generator: Arc<dyn TextGenerator>,
}

impl QueryTransformer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Rewrite a terse query into a longer, search-friendly one.
    pub async fn expand(&self, query: &str) -> String {
        let prompt = format!(
            "Rewrite the following search query so that it matches more relevant documents. \
             Expand abbreviations, add synonyms and related technical terms, and keep it a \
             single query about two to three times longer than the original.\n\n\
             Query: \"{query}\"\n\n\
             Expanded query (only the query, no explanation):"
        );
        self.single_line(&prompt, query, "expansion").await
    }

    /// Break a compound question into two to four simpler ones.
    ///
    /// Returns `[query]` when the reply contains no JSON array of strings.
    pub async fn decompose(&self, query: &str) -> Vec<String> {
        let prompt = format!(
            "Break this question into two to four simpler sub-questions that together \
             answer it.\n\n\
             Question: \"{query}\"\n\n\
             Reply with only a JSON array of strings, for example [\"first\", \"second\"]."
        );
        match self.generator.generate(&prompt).await {
            Ok(reply) => match parse_string_array(&reply) {
                Some(questions) if !questions.is_empty() => {
                    debug!(count = questions.len(), "decomposed query");
                    questions
                }
                _ => {
                    warn!(transform = "decomposition", "reply had no usable JSON array");
                    vec![query.to_string()]
                }
            },
            Err(e) => {
                warn!(transform = "decomposition", error = %e, "query rewrite failed");
                vec![query.to_string()]
            }
        }
    }

    /// Generate a hypothetical answer to search with instead of the question.
    pub async fn hypothetical_answer(&self, query: &str) -> String {
        let prompt = format!(
            "Write a brief, factual answer to this question as if you had perfect \
             knowledge. It will be used to find similar real documents.\n\n\
             Question: \"{query}\"\n\n\
             Answer (two to three paragraphs):"
        );
        match self.generator.generate(&prompt).await {
            Ok(reply) if !reply.trim().is_empty() => reply.trim().to_string(),
            Ok(_) => query.to_string(),
            Err(e) => {
                warn!(transform = "hyde", error = %e, "query rewrite failed");
                query.to_string()
            }
        }
    }

    /// Generalize a specific question to the concept behind it.
    pub async fn step_back(&self, query: &str) -> String {
        let prompt = format!(
            "Identify the broader concept behind this specific question and write a \
             more general search query that captures the background knowledge needed.\n\n\
             Question: \"{query}\"\n\n\
             General query (only the query, no explanation):"
        );
        self.single_line(&prompt, query, "step_back").await
    }

    /// Apply the rewrites enabled in `options`.
    ///
    /// `search_queries` starts with the expanded query (or the original when
    /// expansion is off), followed by sub-questions, the hypothetical answer
    /// and the step-back query.
    pub async fn transform(&self, query: &str, options: TransformOptions) -> TransformedQuery {
        let mut transformed = TransformedQuery {
            original: query.to_string(),
            expanded: None,
            sub_questions: None,
            hypothetical_answer: None,
            step_back: None,
            search_queries: vec![query.to_string()],
        };

        if options.expansion {
            let expanded = self.expand(query).await;
            transformed.search_queries = vec![expanded.clone()];
            transformed.expanded = Some(expanded);
        }

        if options.decomposition && analyze_query(query).is_complex {
            let sub_questions = self.decompose(query).await;
            transformed.search_queries.extend(sub_questions.iter().cloned());
            transformed.sub_questions = Some(sub_questions);
        }

        if options.hyde {
            let answer = self.hypothetical_answer(query).await;
            transformed.search_queries.push(answer.clone());
            transformed.hypothetical_answer = Some(answer);
        }

        if options.step_back {
            let general = self.step_back(query).await;
            transformed.search_queries.push(general.clone());
            transformed.step_back = Some(general);
        }

        debug!(search_queries = transformed.search_queries.len(), "transformed query");
        transformed
    }

    async fn single_line(&self, prompt: &str, query: &str, transform: &str) -> String {
        match self.generator.generate(prompt).await {
            Ok(reply) => {
                let cleaned = strip_quotes(reply.trim());
                if cleaned.is_empty() { query.to_string() } else { cleaned.to_string() }
            }
            Err(e) => {
                warn!(transform, error = %e, "query rewrite failed");
                query.to_string()
            }
        }
    }
}

/// Remove one leading and one trailing quote character.
fn strip_quotes(text: &str) -> &str {
    let is_quote = |c: char| c == '"' || c == '\'';
    let text = text.strip_prefix(is_quote).unwrap_or(text);
    text.strip_suffix(is_quote).unwrap_or(text).trim()
}

/// Parse the span from the first `[` to the last `]` as a JSON string array.
fn parse_string_array(reply: &str) -> Option<Vec<String>> {
    let start = reply.find('[')?;
    let end = reply.rfind(']')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&reply[start..=end]).ok()
}
