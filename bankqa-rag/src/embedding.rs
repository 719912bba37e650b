//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface. Output must be deterministic for a fixed [`model_id`] and
/// always have [`dimensions`] entries. The default
/// [`embed_batch`](EmbeddingProvider::embed_batch) implementation calls
/// [`embed`](EmbeddingProvider::embed) sequentially; backends that support
/// native batching should override it.
///
/// [`model_id`]: EmbeddingProvider::model_id
/// [`dimensions`]: EmbeddingProvider::dimensions
///
/// # Example
///
/// ```rust,ignore
/// use bankqa_rag::EmbeddingProvider;
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
    /// sequentially for each input.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Return a stable identifier for the model and version behind this provider.
    fn model_id(&self) -> &str;

    /// Return the identity an index records for this provider.
    fn info(&self) -> EncoderInfo {
        EncoderInfo { model: self.model_id().to_string(), dimensions: self.dimensions() }
    }
}

/// The identity of the encoder that produced an index's vectors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EncoderInfo {
    /// Model name and version.
    pub model: String,
    /// Vector dimensionality.
    pub dimensions: usize,
}

impl std::fmt::Display for EncoderInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}d", self.model, self.dimensions)
    }
}

/// Compute cosine similarity between two vectors.
///
/// Defined as the dot product divided by the product of the L2 norms.
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
