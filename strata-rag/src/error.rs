//! Error types for the `strata-rag` crate.

use thiserror::Error;

/// Errors that can occur while chunking, scoring, or synthesizing.
#[derive(Debug, Error)]
pub enum RagError {
    /// Chunking or retrieval parameters are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Two vectors of unequal length were compared.
    #[error("Dimension mismatch: expected {expected} dimensions, got {actual}")]
    DimensionMismatch {
        /// Length of the reference vector (the query embedding during retrieval).
        expected: usize,
        /// Length of the vector it was compared against.
        actual: usize,
    },

    /// An outbound embedding call failed, timed out, or no provider is configured.
    #[error("Embedding provider unavailable ({provider}): {message}")]
    EmbeddingProviderUnavailable {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The external text-generation collaborator failed.
    #[error("Synthesis error: {message}")]
    SynthesisError {
        /// A description of the failure.
        message: String,
    },
}

/// The failure class of a [`RagError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`RagError::InvalidConfig`].
    InvalidConfig,
    /// See [`RagError::DimensionMismatch`].
    DimensionMismatch,
    /// See [`RagError::EmbeddingProviderUnavailable`].
    EmbeddingProviderUnavailable,
    /// See [`RagError::SynthesisError`].
    Synthesis,
}

impl RagError {
    /// Return the failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Self::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Self::EmbeddingProviderUnavailable { .. } => ErrorKind::EmbeddingProviderUnavailable,
            Self::SynthesisError { .. } => ErrorKind::Synthesis,
        }
    }

    /// Whether the caller can recover by switching to lexical scoring.
    pub fn is_recoverable(&self) -> bool {
        self.kind() == ErrorKind::EmbeddingProviderUnavailable
    }

    pub(crate) fn provider_unavailable(
        provider: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::EmbeddingProviderUnavailable { provider: provider.into(), message: message.into() }
    }
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(RagError::InvalidConfig("x".into()).kind(), ErrorKind::InvalidConfig);
        assert_eq!(
            RagError::DimensionMismatch { expected: 3, actual: 4 }.kind(),
            ErrorKind::DimensionMismatch
        );
        assert_eq!(
            RagError::provider_unavailable("Mock", "down").kind(),
            ErrorKind::EmbeddingProviderUnavailable
        );
        assert_eq!(RagError::SynthesisError { message: "x".into() }.kind(), ErrorKind::Synthesis);
    }

    #[test]
    fn only_provider_failures_are_recoverable() {
        assert!(RagError::provider_unavailable("Mock", "quota exceeded").is_recoverable());
        assert!(!RagError::InvalidConfig("overlap".into()).is_recoverable());
        assert!(!RagError::DimensionMismatch { expected: 1, actual: 2 }.is_recoverable());
    }

    #[test]
    fn display_includes_provider_and_message() {
        let err = RagError::provider_unavailable("Gemini", "429 Too Many Requests");
        assert_eq!(
            err.to_string(),
            "Embedding provider unavailable (Gemini): 429 Too Many Requests"
        );
    }
}
