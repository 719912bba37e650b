//! Error types for the `bankqa-rag` crate.

use thiserror::Error;

/// Errors that can occur in retrieval and answering operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// A configuration validation error. Raised before any work starts.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A query vector does not match the dimensionality recorded by the index.
    #[error("Dimension mismatch: index expects {expected} dimensions, query has {actual}")]
    DimensionMismatch {
        /// Dimensionality recorded by the index.
        expected: usize,
        /// Dimensionality of the offending vector.
        actual: usize,
    },

    /// The active encoder differs from the encoder that built the index.
    #[error("Encoder mismatch: index was built with '{expected}', active encoder is '{actual}'")]
    EncoderMismatch {
        /// Encoder identity recorded by the index.
        expected: String,
        /// Identity of the active encoder.
        actual: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The external text-generation capability failed.
    #[error("Generation unavailable ({generator}): {message}")]
    GenerationUnavailable {
        /// The generator that produced the error.
        generator: String,
        /// A description of the failure.
        message: String,
    },

    /// A stored index snapshot could not be used.
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
