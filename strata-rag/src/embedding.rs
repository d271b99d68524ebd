//! Embedding provider trait and the concurrent fan-out used by the retriever.

use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, error};

use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap a specific backend (Gemini, a local model, a test
/// double) behind a unified async interface. Transport or quota failures
/// should be reported as
/// [`RagError::EmbeddingProviderUnavailable`] so that callers can fall back
/// to lexical scoring.
///
/// # Example
///
/// ```rust,ignore
/// use strata_rag::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// The default implementation calls [`embed`](EmbeddingProvider::embed)
    /// sequentially for each input. Override this method if the backend
    /// supports native batch embedding for better throughput.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// A short name used in logs and error messages.
    fn name(&self) -> &str {
        "embedding"
    }
}

/// Embed one text, treating an elapsed `timeout` as a provider failure.
pub(crate) async fn embed_with_timeout(
    provider: &dyn EmbeddingProvider,
    text: &str,
    timeout: Option<Duration>,
) -> Result<Vec<f32>> {
    let Some(limit) = timeout else {
        return provider.embed(text).await;
    };

    match tokio::time::timeout(limit, provider.embed(text)).await {
        Ok(result) => result,
        Err(_) => {
            error!(
                provider = provider.name(),
                timeout_ms = limit.as_millis() as u64,
                "embedding call timed out"
            );
            Err(RagError::provider_unavailable(
                provider.name(),
                format!("embedding call timed out after {}ms", limit.as_millis()),
            ))
        }
    }
}

/// Embed every text with at most `concurrency` calls in flight.
///
/// The returned vectors are in the same order as `texts` regardless of the
/// order in which calls complete. The first failure aborts the fan-out and
/// drops every call still in flight.
///
/// Results are yielded in input order, so a failure surfaces only once every
/// earlier call has finished. Without a `timeout`, a stalled earlier call
/// holds back the error indefinitely.
pub(crate) async fn embed_all(
    provider: &dyn EmbeddingProvider,
    texts: &[&str],
    concurrency: usize,
    timeout: Option<Duration>,
) -> Result<Vec<Vec<f32>>> {
    debug!(provider = provider.name(), count = texts.len(), concurrency, "embedding texts");

    stream::iter(texts.iter().copied())
        .map(|text| embed_with_timeout(provider, text, timeout))
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}
