//! Query-time retrieval over an [`EmbeddingIndex`].
//!
//! The [`Retriever`] embeds a query with the encoder that built the index and
//! ranks chunks either by vector similarity alone or, in hybrid mode, by a
//! weighted sum of vector similarity and lexical keyword overlap.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error};

use crate::config::{RagConfig, RetrievalMode};
use crate::document::RetrievalResult;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::EmbeddingIndex;
use crate::text::{keywords, tokenize};

/// Ranks indexed chunks for a query.
///
/// Holds the index by `Arc` so that many retrievers (and evaluation workers)
/// can share one read-only index.
pub struct Retriever {
    index: Arc<EmbeddingIndex>,
    encoder: Arc<dyn EmbeddingProvider>,
    vector_weight: f32,
    lexical_weight: f32,
    similarity_threshold: Option<f32>,
    /// Distinct lower-cased tokens of each indexed chunk, in insertion order.
    chunk_terms: Vec<HashSet<String>>,
}

impl Retriever {
    /// Create a retriever over `index` using `encoder` for queries.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`](crate::RagError::Config) if `config` is
    /// invalid and [`RagError::EncoderMismatch`](crate::RagError::EncoderMismatch)
    /// if `encoder` is not the encoder that built `index`.
    pub fn new(
        index: Arc<EmbeddingIndex>,
        encoder: Arc<dyn EmbeddingProvider>,
        config: &RagConfig,
    ) -> Result<Self> {
        config.validate()?;
        index.ensure_encoder(&encoder.info())?;

        let chunk_terms = index
            .entries()
            .iter()
            .map(|entry| tokenize(&entry.chunk.text).into_iter().collect())
            .collect();

        Ok(Self {
            index,
            encoder,
            vector_weight: config.vector_weight,
            lexical_weight: config.lexical_weight,
            similarity_threshold: config.similarity_threshold,
            chunk_terms,
        })
    }

    /// The index this retriever searches.
    pub fn index(&self) -> &Arc<EmbeddingIndex> {
        &self.index
    }

    /// The encoder used to embed queries.
    pub fn encoder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.encoder
    }

    /// Check that `config` carries the hybrid weights and similarity threshold
    /// this retriever was built with.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] naming both settings when they differ.
    pub fn ensure_scoring(&self, config: &RagConfig) -> Result<()> {
        let matches = config.vector_weight == self.vector_weight
            && config.lexical_weight == self.lexical_weight
            && config.similarity_threshold == self.similarity_threshold;
        if matches {
            return Ok(());
        }
        Err(RagError::Config(format!(
            "config scoring (vector_weight={}, lexical_weight={}, similarity_threshold={:?}) \
             differs from the retriever's (vector_weight={}, lexical_weight={}, \
             similarity_threshold={:?})",
            config.vector_weight,
            config.lexical_weight,
            config.similarity_threshold,
            self.vector_weight,
            self.lexical_weight,
            self.similarity_threshold,
        )))
    }

    /// Default settings carrying this retriever's weights and threshold.
    pub(crate) fn scoring_config(&self) -> RagConfig {
        RagConfig {
            vector_weight: self.vector_weight,
            lexical_weight: self.lexical_weight,
            similarity_threshold: self.similarity_threshold,
            ..RagConfig::default()
        }
    }

    /// Retrieve the `top_k` best chunks for `query`.
    ///
    /// Results are ordered by non-increasing score with ties in index
    /// insertion order, so the output is fully determined by the index,
    /// query, `top_k`, and mode.
    ///
    /// # Errors
    ///
    /// Propagates encoder failures and
    /// [`RagError::DimensionMismatch`](crate::RagError::DimensionMismatch).
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        mode: RetrievalMode,
    ) -> Result<RetrievalResult> {
        let query_vector = self.encoder.embed(query).await.inspect_err(|e| {
            error!(error = %e, "embedding failed during retrieval");
        })?;

        let results = match mode {
            RetrievalMode::Vector => self.index.search(&query_vector, top_k)?,
            RetrievalMode::Hybrid => {
                let vector_scores = self.index.similarities(&query_vector)?;
                let lexical_scores = self.lexical_scores(query);
                let combined: Vec<f32> = vector_scores
                    .iter()
                    .zip(&lexical_scores)
                    .map(|(v, l)| self.vector_weight * v + self.lexical_weight * l)
                    .collect();
                self.index.top_k_by(&combined, top_k)
            }
        };

        let results: RetrievalResult = match self.similarity_threshold {
            Some(threshold) => results.into_iter().filter(|r| r.score >= threshold).collect(),
            None => results,
        };

        debug!(?mode, top_k, result_count = results.len(), "retrieval completed");
        Ok(results)
    }

    /// Fraction of the query's keywords found in each chunk, in insertion order.
    ///
    /// A query with no keywords (only stop-words) scores 0 against every chunk.
    pub fn lexical_scores(&self, query: &str) -> Vec<f32> {
        let query_terms = keywords(query);
        if query_terms.is_empty() {
            return vec![0.0; self.chunk_terms.len()];
        }
        self.chunk_terms
            .iter()
            .map(|terms| {
                let hits = query_terms.iter().filter(|t| terms.contains(t.as_str())).count();
                hits as f32 / query_terms.len() as f32
            })
            .collect()
    }
}
