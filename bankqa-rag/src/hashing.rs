//! Local feature-hashing embedding provider.
//!
//! [`HashingEmbeddingProvider`] maps the non-stop-word tokens of a text, and
//! the bigrams between consecutive ones, into a fixed number of signed
//! buckets and L2-normalises the result. It needs no model files or API keys
//! and is deterministic across runs and platforms, which makes it the default
//! encoder for offline use and tests.

use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::text::{is_stop_word, tokenize};

/// Default number of hash buckets.
pub const DEFAULT_DIMENSIONS: usize = 512;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// A bag-of-words encoder using the hashing trick.
#[derive(Debug, Clone)]
pub struct HashingEmbeddingProvider {
    dimensions: usize,
    model_id: String,
}

impl HashingEmbeddingProvider {
    /// Create a provider with the given number of buckets.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `dimensions == 0`.
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(RagError::Config("hashing dimensions must be greater than zero".into()));
        }
        Ok(Self::with_dimensions(dimensions))
    }

    fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions, model_id: format!("hashing-fnv1a-v2-{dimensions}") }
    }

    /// Encode synchronously. Used by the async trait methods.
    pub fn encode(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let terms: Vec<String> = tokenize(text).into_iter().filter(|t| !is_stop_word(t)).collect();

        for term in &terms {
            self.add_feature(&mut vector, term.as_bytes());
        }
        for pair in terms.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            self.add_feature(&mut vector, bigram.as_bytes());
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }

    fn add_feature(&self, vector: &mut [f32], feature: &[u8]) {
        let hash = fnv1a(feature);
        let bucket = (hash % self.dimensions as u64) as usize;
        // The top bit picks the sign so colliding features tend to cancel.
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign;
    }
}

impl Default for HashingEmbeddingProvider {
    fn default() -> Self {
        Self::with_dimensions(DEFAULT_DIMENSIONS)
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.encode(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::cosine_similarity;

    #[test]
    fn output_has_requested_dimensions_and_unit_norm() {
        let provider = HashingEmbeddingProvider::new(64).unwrap();
        let v = provider.encode("Domestic wire transfers cost $30.00");
        assert_eq!(v.len(), 64);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn stop_word_only_text_is_zero_vector() {
        let provider = HashingEmbeddingProvider::default();
        assert!(provider.encode("what is the").iter().all(|x| *x == 0.0));
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = HashingEmbeddingProvider::default();
        let b = HashingEmbeddingProvider::default();
        assert_eq!(a.encode("Zelle limit"), b.encode("Zelle limit"));
    }

    #[test]
    fn shared_vocabulary_scores_higher() {
        let provider = HashingEmbeddingProvider::default();
        let query = provider.encode("international wire fee");
        let related = provider.encode("International wire transfers carry a $45 fee.");
        let unrelated = provider.encode("Reset your password from the login page.");
        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[test]
    fn zero_dimensions_is_rejected() {
        assert!(HashingEmbeddingProvider::new(0).is_err());
    }

    #[test]
    fn model_id_records_dimensions() {
        let provider = HashingEmbeddingProvider::new(128).unwrap();
        assert_eq!(provider.info().dimensions, 128);
        assert!(provider.model_id().ends_with("128"));
    }
}
