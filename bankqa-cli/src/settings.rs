//! The optional JSON settings file.

use std::path::Path;

use anyhow::{Context, Result};
use bankqa_eval::EvalConfig;
use bankqa_rag::RagConfig;
use serde::{Deserialize, Serialize};

/// Pipeline and evaluation settings, each section optional.
///
/// ```json
/// { "rag": { "chunk_size": 600, "retrieval_mode": "hybrid" },
///   "eval": { "pass_threshold": 0.4, "case_timeout_ms": 30000 } }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub rag: RagConfig,
    pub eval: EvalConfig,
}

impl Settings {
    /// Read settings from `path`, or use defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let settings: Self = serde_json::from_str(&content)
            .with_context(|| format!("invalid settings file {}", path.display()))?;
        Ok(settings)
    }
}
