//! Configuration for chunking, retrieval, and prompt assembly.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// How the retriever ranks chunks.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    /// Rank by cosine similarity between query and chunk embeddings.
    #[default]
    Vector,
    /// Rank by a weighted sum of vector similarity and lexical overlap.
    Hybrid,
}

impl std::str::FromStr for RetrievalMode {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "vector" => Ok(Self::Vector),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(RagError::Config(format!(
                "unknown retrieval mode '{other}' (expected 'vector' or 'hybrid')"
            ))),
        }
    }
}

/// Configuration parameters for the RAG pipeline.
///
/// Construct through [`RagConfig::builder`] so that every field is validated
/// once, up front. A value deserialized from a settings file should be passed
/// through [`RagConfig::validate`] before use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of characters each chunk re-reads from the end of its predecessor.
    pub chunk_overlap: usize,
    /// Number of top results to return from retrieval.
    pub top_k: usize,
    /// Ranking mode used by the retriever.
    pub retrieval_mode: RetrievalMode,
    /// Weight of the vector similarity in hybrid mode.
    pub vector_weight: f32,
    /// Weight of the lexical overlap in hybrid mode.
    pub lexical_weight: f32,
    /// Maximum number of context characters placed in a prompt.
    pub context_budget: usize,
    /// Results scoring below this value are dropped after ranking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f32>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 100,
            top_k: 3,
            retrieval_mode: RetrievalMode::Vector,
            vector_weight: 0.7,
            lexical_weight: 0.3,
            context_budget: 4000,
            similarity_threshold: None,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that all parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_size == 0` or `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - either hybrid weight is negative or non-finite, or both are zero
    /// - `context_budget == 0`
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        let weights = [("vector_weight", self.vector_weight), ("lexical_weight", self.lexical_weight)];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(RagError::Config(format!(
                    "{name} must be a finite non-negative number, got {weight}"
                )));
            }
        }
        if self.vector_weight == 0.0 && self.lexical_weight == 0.0 {
            return Err(RagError::Config(
                "vector_weight and lexical_weight cannot both be zero".to_string(),
            ));
        }
        if self.context_budget == 0 {
            return Err(RagError::Config("context_budget must be greater than zero".to_string()));
        }
        if let Some(threshold) = self.similarity_threshold {
            if !threshold.is_finite() {
                return Err(RagError::Config("similarity_threshold must be finite".to_string()));
            }
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of top results to return.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the retrieval mode.
    pub fn retrieval_mode(mut self, mode: RetrievalMode) -> Self {
        self.config.retrieval_mode = mode;
        self
    }

    /// Set the vector and lexical weights used in hybrid mode.
    pub fn hybrid_weights(mut self, vector: f32, lexical: f32) -> Self {
        self.config.vector_weight = vector;
        self.config.lexical_weight = lexical;
        self
    }

    /// Set the prompt context budget in characters.
    pub fn context_budget(mut self, chars: usize) -> Self {
        self.config.context_budget = chars;
        self
    }

    /// Set the minimum score for retrieved results.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = Some(threshold);
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(RagConfig::default().validate().is_ok());
    }

    #[test]
    fn overlap_not_smaller_than_size_is_rejected() {
        let err = RagConfig::builder().chunk_size(50).chunk_overlap(50).build().unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }

    #[test]
    fn zero_weights_are_rejected() {
        let err = RagConfig::builder().hybrid_weights(0.0, 0.0).build().unwrap_err();
        assert!(err.to_string().contains("cannot both be zero"));
    }

    #[test]
    fn negative_weight_is_rejected() {
        assert!(RagConfig::builder().hybrid_weights(-0.1, 1.0).build().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: RagConfig =
            serde_json::from_str(r#"{"top_k": 5, "retrieval_mode": "hybrid"}"#).unwrap();
        assert_eq!(config.top_k, 5);
        assert_eq!(config.retrieval_mode, RetrievalMode::Hybrid);
        assert_eq!(config.chunk_size, 800);
    }

    #[test]
    fn retrieval_mode_parses_case_insensitively() {
        assert_eq!("Hybrid".parse::<RetrievalMode>().unwrap(), RetrievalMode::Hybrid);
        assert!("bm25".parse::<RetrievalMode>().is_err());
    }
}
