//! Error types for the `bankqa-eval` crate.

use bankqa_rag::RagError;
use thiserror::Error;

/// Errors that stop an evaluation before it starts.
///
/// Failures of individual cases are not errors: they are recorded as
/// zero-scored cases in the report.
#[derive(Debug, Error)]
pub enum EvalError {
    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Rag(#[from] RagError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

/// A convenience result type for evaluation operations.
pub type Result<T> = std::result::Result<T, EvalError>;
