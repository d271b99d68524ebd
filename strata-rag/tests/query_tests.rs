//! Query rewriting through a scripted text generator.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use strata_rag::{
    QueryTransformer, RagError, Result, TextGenerator, TransformOptions, analyze_query,
};

/// Replies from a fixed script, in order, and records every prompt.
struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn new(replies: Vec<Result<String>>) -> Arc<Self> {
        Arc::new(Self { replies: Mutex::new(replies.into()), prompts: Mutex::new(Vec::new()) })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(RagError::SynthesisError { message: "script exhausted".into() })
            })
    }
}

fn ok(reply: &str) -> Result<String> {
    Ok(reply.to_string())
}

fn failure() -> Result<String> {
    Err(RagError::SynthesisError { message: "rate limited".into() })
}

#[tokio::test]
async fn expansion_strips_quotes_and_replaces_search_query() {
    let generator = ScriptedGenerator::new(vec![ok("  \"rust ownership and borrowing rules\"  ")]);
    let transformer = QueryTransformer::new(generator.clone());

    let transformed = transformer.transform("rust ownership", TransformOptions::default()).await;

    assert_eq!(transformed.original, "rust ownership");
    assert_eq!(transformed.expanded.as_deref(), Some("rust ownership and borrowing rules"));
    assert_eq!(transformed.search_queries, vec!["rust ownership and borrowing rules"]);
    assert!(generator.prompts()[0].contains("Query: \"rust ownership\""));
}

#[tokio::test]
async fn failed_expansion_keeps_original_query() {
    let transformer = QueryTransformer::new(ScriptedGenerator::new(vec![failure()]));
    assert_eq!(transformer.expand("AI issues").await, "AI issues");

    let transformer = QueryTransformer::new(ScriptedGenerator::new(vec![ok("   ")]));
    assert_eq!(transformer.expand("AI issues").await, "AI issues");
}

#[tokio::test]
async fn decomposition_appends_sub_questions() {
    let generator = ScriptedGenerator::new(vec![ok("Here are the sub-questions:\n\
         [\"What is RAG?\", \"What is fine-tuning?\", \"Which costs less?\"]")]);
    let transformer = QueryTransformer::new(generator.clone());
    let options = TransformOptions { expansion: false, decomposition: true, ..Default::default() };

    let query = "Compare RAG versus fine-tuning for support bots";
    let transformed = transformer.transform(query, options).await;

    assert_eq!(
        transformed.sub_questions.unwrap(),
        vec!["What is RAG?", "What is fine-tuning?", "Which costs less?"]
    );
    assert_eq!(transformed.search_queries.len(), 4);
    assert_eq!(transformed.search_queries[0], query);
    assert_eq!(generator.prompts().len(), 1);
}

#[tokio::test]
async fn decomposition_is_skipped_for_simple_queries() {
    let generator = ScriptedGenerator::new(vec![]);
    let transformer = QueryTransformer::new(generator.clone());
    let options = TransformOptions { expansion: false, decomposition: true, ..Default::default() };

    let transformed = transformer.transform("what is ownership", options).await;

    assert!(transformed.sub_questions.is_none());
    assert_eq!(transformed.search_queries, vec!["what is ownership"]);
    assert!(generator.prompts().is_empty());
}

#[tokio::test]
async fn unparseable_decomposition_falls_back_to_query() {
    let generator = ScriptedGenerator::new(vec![ok("1. What is RAG? 2. What is tuning?")]);
    let transformer = QueryTransformer::new(generator);
    let query = "Compare RAG and fine-tuning";
    assert_eq!(transformer.decompose(query).await, vec![query.to_string()]);
}

#[tokio::test]
async fn all_transforms_are_ordered() {
    let generator = ScriptedGenerator::new(vec![
        ok("expanded query"),
        ok("[\"part one\", \"part two\"]"),
        ok("A hypothetical passage."),
        ok("general concept"),
    ]);
    let transformer = QueryTransformer::new(generator.clone());
    let options =
        TransformOptions { expansion: true, decomposition: true, hyde: true, step_back: true };

    let transformed = transformer.transform("first thing and also second thing", options).await;

    assert_eq!(
        transformed.search_queries,
        vec!["expanded query", "part one", "part two", "A hypothetical passage.", "general concept"]
    );
    assert_eq!(transformed.hypothetical_answer.as_deref(), Some("A hypothetical passage."));
    assert_eq!(transformed.step_back.as_deref(), Some("general concept"));
    assert_eq!(generator.prompts().len(), 4);
}

#[tokio::test]
async fn suggested_transforms_drive_options() {
    let query = "How do I fix this borrow checker error in my code";
    let analysis = analyze_query(query);
    let options = TransformOptions::from(analysis.suggested);
    assert!(options.step_back);
    assert!(!options.hyde);

    let generator = ScriptedGenerator::new(vec![ok("'Rust ownership and lifetimes'")]);
    let transformer = QueryTransformer::new(generator);
    let transformed = transformer.transform(query, options).await;

    assert_eq!(transformed.step_back.as_deref(), Some("Rust ownership and lifetimes"));
    assert_eq!(transformed.search_queries, vec![query, "Rust ownership and lifetimes"]);
}
