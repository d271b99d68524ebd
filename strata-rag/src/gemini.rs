//! Gemini embedding provider using the Generative Language REST API.
//!
//! This module is only available when the `gemini` feature is enabled.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// The default Generative Language API base URL.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The default embedding model.
const DEFAULT_MODEL: &str = "text-embedding-004";

/// Output dimensionality of `text-embedding-004`.
const DEFAULT_DIMENSIONS: usize = 768;

const PROVIDER: &str = "Gemini";

/// Credentials and model selection for [`GeminiEmbeddingProvider`].
#[derive(Clone)]
pub struct GeminiEmbeddingConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// If set, passed to the API to truncate the output vector.
    pub output_dimensionality: Option<usize>,
}

impl GeminiEmbeddingConfig {
    /// Create a config for the default model and endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
            output_dimensionality: None,
        }
    }
}

impl fmt::Debug for GeminiEmbeddingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiEmbeddingConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("output_dimensionality", &self.output_dimensionality)
            .finish()
    }
}

/// An [`EmbeddingProvider`] backed by the Gemini `embedContent` and
/// `batchEmbedContents` endpoints.
///
/// Every failure, including non-2xx responses, is reported as
/// [`RagError::EmbeddingProviderUnavailable`]. Requests are not retried.
///
/// # Example
///
/// ```rust,ignore
/// use strata_rag::gemini::GeminiEmbeddingProvider;
///
/// let provider = GeminiEmbeddingProvider::from_env()?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct GeminiEmbeddingProvider {
    client: reqwest::Client,
    config: GeminiEmbeddingConfig,
}

impl GeminiEmbeddingProvider {
    /// Create a provider from an explicit config.
    pub fn new(config: GeminiEmbeddingConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(RagError::InvalidConfig("Gemini API key must not be empty".into()));
        }
        if config.output_dimensionality == Some(0) {
            return Err(RagError::InvalidConfig(
                "output_dimensionality must be greater than zero".into(),
            ));
        }
        Ok(Self { client: reqwest::Client::new(), config })
    }

    /// Create a provider using `GEMINI_API_KEY`, or `GOOGLE_API_KEY` if unset.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .map_err(|_| {
                RagError::InvalidConfig(
                    "neither GEMINI_API_KEY nor GOOGLE_API_KEY is set".into(),
                )
            })?;
        Self::new(GeminiEmbeddingConfig::new(api_key))
    }

    /// Use a custom [`reqwest::Client`] (proxies, timeouts, TLS settings).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn model_path(&self) -> String {
        format!("models/{}", self.config.model)
    }

    fn request<'a>(&'a self, model: &'a str, text: &'a str) -> EmbedContentRequest<'a> {
        EmbedContentRequest {
            model,
            content: Content { parts: vec![Part { text }] },
            output_dimensionality: self.config.output_dimensionality,
        }
    }

    async fn post<B, R>(&self, method: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/{}:{method}", self.config.base_url, self.model_path());

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                RagError::provider_unavailable(PROVIDER, format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = PROVIDER, %status, "API error");
            return Err(RagError::provider_unavailable(
                PROVIDER,
                format!("API returned {status}: {detail}"),
            ));
        }

        response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            RagError::provider_unavailable(PROVIDER, format!("failed to parse response: {e}"))
        })
    }
}

// ── Generative Language API request/response types ─────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<usize>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), "embedding single text");

        let model = self.model_path();
        let response: EmbedContentResponse =
            self.post("embedContent", &self.request(&model, text)).await?;
        Ok(response.embedding.values)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = PROVIDER,
            batch_size = texts.len(),
            model = %self.config.model,
            "embedding batch"
        );

        let model = self.model_path();
        let body = BatchEmbedRequest {
            requests: texts.iter().map(|text| self.request(&model, text)).collect(),
        };
        let response: BatchEmbedResponse = self.post("batchEmbedContents", &body).await?;

        if response.embeddings.len() != texts.len() {
            return Err(RagError::provider_unavailable(
                PROVIDER,
                format!(
                    "expected {} embeddings, API returned {}",
                    texts.len(),
                    response.embeddings.len()
                ),
            ));
        }

        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }

    fn dimensions(&self) -> usize {
        self.config.output_dimensionality.unwrap_or(DEFAULT_DIMENSIONS)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
