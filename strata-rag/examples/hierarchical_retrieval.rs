//! # Hierarchical Retrieval Example
//!
//! Chunks a document into parent blocks and child windows, retrieves the best
//! parents for a few queries, then repeats one query with an embedding
//! provider that is down to show the lexical fallback.
//!
//! Uses a deterministic `MockEmbeddingProvider` so it runs with **zero API keys**.
//!
//! Run: `RUST_LOG=strata_rag=debug cargo run --example hierarchical_retrieval`

use std::sync::Arc;

use async_trait::async_trait;
use strata_rag::{
    EmbeddingProvider, RagError, RetrievalConfig, Retriever, ScoringMode, TextGenerator,
    format_context, synthesize_answer,
};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// MockEmbeddingProvider: bag-of-words hashed into a fixed number of buckets
// ---------------------------------------------------------------------------

struct MockEmbeddingProvider {
    dimensions: usize,
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> strata_rag::Result<Vec<f32>> {
        // Texts sharing words share buckets, so cosine similarity tracks overlap.
        let mut emb = vec![0.0f32; self.dimensions];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| w.len() > 3) {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            emb[(hash % self.dimensions as u64) as usize] += 1.0;
        }
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            emb.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(emb)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "Mock"
    }
}

/// A provider whose backend is unreachable.
struct OfflineProvider;

#[async_trait]
impl EmbeddingProvider for OfflineProvider {
    async fn embed(&self, _text: &str) -> strata_rag::Result<Vec<f32>> {
        Err(RagError::EmbeddingProviderUnavailable {
            provider: "Offline".into(),
            message: "connection refused".into(),
        })
    }

    fn dimensions(&self) -> usize {
        128
    }
}

/// Answers with the first sentence of the top-ranked passage.
struct ExtractiveGenerator;

#[async_trait]
impl TextGenerator for ExtractiveGenerator {
    async fn generate(&self, prompt: &str) -> strata_rag::Result<String> {
        let first_passage = prompt
            .lines()
            .find_map(|line| line.strip_prefix("1. "))
            .and_then(|line| line.split_once("] "))
            .map(|(_, text)| text)
            .unwrap_or_default();
        let sentence = first_passage.split_inclusive('.').next().unwrap_or(first_passage);
        Ok(format!("{} [1]", sentence.trim()))
    }
}

const DOCUMENT: &str = "\
Rust is a systems programming language focused on safety, speed, and concurrency. \
It achieves memory safety without a garbage collector through its ownership system, \
in which every value has a single owner and is dropped when that owner goes out of scope. \
References borrow values without taking ownership, and the borrow checker verifies at \
compile time that no reference outlives the data it points to.

Python is a high-level, interpreted programming language known for its readability and \
versatility. It is widely used in data science, web development, and automation, and its \
package ecosystem covers everything from numerical computing to machine learning. Dynamic \
typing keeps small scripts short at the cost of catching some errors only at runtime.

Retrieval-augmented generation combines a retrieval system with a language model. \
Documents are chunked and embedded, and at query time the most relevant chunks are \
retrieved and handed to the model as context. Hierarchical chunking matches small child \
windows against the query but returns the larger parent block, so the model sees the \
surrounding context rather than a fragment.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    // -- 1. Configure small chunks for a short document -------------------
    // parent_size=40 puts each paragraph in its own parent; child windows of
    // 15 words overlap by 5.
    let config = RetrievalConfig::builder()
        .parent_size(40)
        .child_size(15)
        .child_overlap(5)
        .top_k(2)
        .build()?;

    let retriever = Retriever::builder()
        .config(config.clone())
        .embedding_provider(Arc::new(MockEmbeddingProvider { dimensions: 128 }))
        .build()?;

    // -- 2. Chunk the document --------------------------------------------
    let parents = retriever.chunk(DOCUMENT);
    println!("Chunked document into {} parent block(s):", parents.len());
    for parent in &parents {
        println!(
            "  parent {} → {} words, {} child window(s)",
            parent.id,
            parent.word_count(),
            parent.children.len()
        );
    }

    // -- 3. Query in both scoring modes -----------------------------------
    let queries = ["memory safety and ownership", "data science language", "parent block context"];
    for query in queries {
        for mode in [ScoringMode::Embedding, ScoringMode::Lexical] {
            let results = retriever.retrieve(&parents, query, 2, mode).await?;
            println!("\nQuery: \"{query}\" ({mode})");
            if results.is_empty() {
                println!("  (no results)");
            } else {
                for line in format_context(&results).lines() {
                    // Show a short preview of each passage.
                    println!("  {}", line.chars().take(100).collect::<String>());
                }
            }
        }
    }

    // -- 4. Fall back to lexical scoring when embeddings are down ---------
    let offline = Retriever::builder()
        .config(config)
        .embedding_provider(Arc::new(OfflineProvider))
        .build()?;
    let query = "borrow checker references";
    let outcome = offline.retrieve_with_fallback(&parents, query, 2).await?;
    println!(
        "\nQuery: \"{query}\" answered in {} mode ({})",
        outcome.mode,
        outcome.fallback_reason.as_deref().unwrap_or("no fallback")
    );

    // -- 5. Hand the passages to a generator ------------------------------
    let answer = synthesize_answer(&ExtractiveGenerator, query, outcome).await?;
    println!("Answer: {}", answer.answer);
    println!("{}", serde_json::to_string_pretty(&answer)?);

    println!("\nDone.");
    Ok(())
}
