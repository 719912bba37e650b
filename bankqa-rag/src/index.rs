//! Immutable embedding index with exact cosine-similarity search.
//!
//! [`EmbeddingIndex`] stores `(chunk, vector)` pairs in insertion order and
//! records the [`EncoderInfo`] that produced them. It is built once per
//! corpus and never mutated afterwards, so it can be shared behind an `Arc`
//! and searched from many tasks at once.
//!
//! Search is a linear scan over every stored vector. Ties keep insertion
//! order.

use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{error, info};

use crate::document::{Chunk, Document, RetrievalResult, SearchResult};
use crate::embedding::{EmbeddingProvider, EncoderInfo, cosine_similarity};
use crate::error::{RagError, Result};

/// Version of the on-disk snapshot layout written by [`EmbeddingIndex::save`].
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Number of chunk texts sent to the encoder per call during [`EmbeddingIndex::build`].
const BUILD_BATCH_SIZE: usize = 100;

/// A chunk together with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedChunk {
    /// The indexed chunk.
    pub chunk: Chunk,
    /// The embedding of `chunk.text`.
    pub vector: Vec<f32>,
}

/// An immutable collection of embedded chunks.
///
/// # Example
///
/// ```rust,ignore
/// use bankqa_rag::{EmbeddingIndex, HashingEmbeddingProvider};
///
/// let encoder = HashingEmbeddingProvider::default();
/// let index = EmbeddingIndex::build(chunks, &encoder).await?;
/// let results = index.search(&encoder.embed("zelle limit").await?, 3)?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingIndex {
    encoder: EncoderInfo,
    entries: Vec<IndexedChunk>,
}

impl EmbeddingIndex {
    /// Embed every chunk with `encoder` and collect the results into an index.
    ///
    /// Chunks are sent to the encoder in batches; insertion order follows
    /// the order of `chunks`.
    ///
    /// # Errors
    ///
    /// Propagates encoder failures, and returns
    /// [`RagError::DimensionMismatch`] if the encoder returns a vector whose
    /// length differs from its reported dimensionality.
    pub async fn build(chunks: Vec<Chunk>, encoder: &dyn EmbeddingProvider) -> Result<Self> {
        let info = encoder.info();
        let mut entries = Vec::with_capacity(chunks.len());

        let mut remaining = chunks.into_iter().peekable();
        while remaining.peek().is_some() {
            let batch: Vec<Chunk> = remaining.by_ref().take(BUILD_BATCH_SIZE).collect();
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();

            let vectors = encoder.embed_batch(&texts).await.inspect_err(|e| {
                error!(encoder = %info, error = %e, "embedding failed during index build");
            })?;
            if vectors.len() != batch.len() {
                return Err(RagError::Embedding {
                    provider: info.model.clone(),
                    message: format!(
                        "encoder returned {} vectors for {} inputs",
                        vectors.len(),
                        batch.len()
                    ),
                });
            }

            for (chunk, vector) in batch.into_iter().zip(vectors) {
                if vector.len() != info.dimensions {
                    return Err(RagError::DimensionMismatch {
                        expected: info.dimensions,
                        actual: vector.len(),
                    });
                }
                entries.push(IndexedChunk { chunk, vector });
            }
        }

        info!(encoder = %info, chunk_count = entries.len(), "built embedding index");
        Ok(Self { encoder: info, entries })
    }

    /// The identity of the encoder that built this index.
    pub fn encoder(&self) -> &EncoderInfo {
        &self.encoder
    }

    /// The dimensionality every stored and query vector must have.
    pub fn dimensions(&self) -> usize {
        self.encoder.dimensions
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Indexed chunks in insertion order.
    pub fn entries(&self) -> &[IndexedChunk] {
        &self.entries
    }

    /// Fail unless `encoder` is the encoder this index was built with.
    pub fn ensure_encoder(&self, encoder: &EncoderInfo) -> Result<()> {
        if &self.encoder != encoder {
            return Err(RagError::EncoderMismatch {
                expected: self.encoder.to_string(),
                actual: encoder.to_string(),
            });
        }
        Ok(())
    }

    /// Cosine similarity of `query` against every entry, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if `query` has the wrong length.
    pub fn similarities(&self, query: &[f32]) -> Result<Vec<f32>> {
        if query.len() != self.dimensions() {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions(),
                actual: query.len(),
            });
        }
        Ok(self.entries.iter().map(|e| cosine_similarity(&e.vector, query)).collect())
    }

    /// Return the `top_k` chunks most similar to `query`.
    ///
    /// The result has `min(top_k, len())` entries ordered by non-increasing
    /// score; equal scores keep insertion order. Searching an empty index
    /// returns an empty result.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if `query` has the wrong length.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<RetrievalResult> {
        let scores = self.similarities(query)?;
        Ok(self.top_k_by(&scores, top_k))
    }

    /// Rank entries by externally computed `scores` (one per entry, in
    /// insertion order) and keep the best `top_k`.
    pub(crate) fn top_k_by(&self, scores: &[f32], top_k: usize) -> RetrievalResult {
        let mut order: Vec<usize> = (0..self.entries.len()).collect();
        // `sort_by` is stable, so equal scores stay in insertion order. A NaN
        // score still has a fixed place under `total_cmp`.
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        order.truncate(top_k);
        order
            .into_iter()
            .map(|i| SearchResult { chunk: self.entries[i].chunk.clone(), score: scores[i] })
            .collect()
    }

    /// Write the index to `path` as a JSON snapshot tagged with `corpus_version`.
    pub fn save(&self, path: impl AsRef<Path>, corpus_version: &str) -> Result<()> {
        let path = path.as_ref();
        let snapshot = SnapshotRef {
            format_version: SNAPSHOT_FORMAT_VERSION,
            corpus_version,
            index: self,
        };
        let mut writer = BufWriter::new(std::fs::File::create(path)?);
        serde_json::to_writer(&mut writer, &snapshot)?;
        writer.flush()?;
        info!(path = %path.display(), chunk_count = self.len(), "saved index snapshot");
        Ok(())
    }

    /// Read a snapshot written by [`save`](Self::save) and validate it
    /// against the active encoder and corpus.
    ///
    /// # Errors
    ///
    /// - [`RagError::Persistence`] if the snapshot format or corpus version
    ///   differs, or a stored vector has the wrong length
    /// - [`RagError::EncoderMismatch`] if the snapshot was built by another encoder
    pub fn load(
        path: impl AsRef<Path>,
        encoder: &EncoderInfo,
        corpus_version: &str,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let snapshot: Snapshot = serde_json::from_reader(std::io::BufReader::new(file))?;

        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(RagError::Persistence(format!(
                "snapshot format {} is not supported (expected {SNAPSHOT_FORMAT_VERSION})",
                snapshot.format_version
            )));
        }
        if snapshot.corpus_version != corpus_version {
            return Err(RagError::Persistence(format!(
                "snapshot was built for corpus {}, current corpus is {corpus_version}",
                snapshot.corpus_version
            )));
        }
        let index = snapshot.index;
        index.ensure_encoder(encoder)?;
        if let Some(bad) = index.entries.iter().find(|e| e.vector.len() != index.dimensions()) {
            return Err(RagError::Persistence(format!(
                "chunk '{}' has {} dimensions, index records {}",
                bad.chunk.id,
                bad.vector.len(),
                index.dimensions()
            )));
        }

        info!(path = %path.display(), chunk_count = index.len(), "loaded index snapshot");
        Ok(index)
    }
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    format_version: u32,
    corpus_version: &'a str,
    index: &'a EmbeddingIndex,
}

#[derive(Deserialize)]
struct Snapshot {
    format_version: u32,
    corpus_version: String,
    index: EmbeddingIndex,
}

/// A hex SHA-256 digest over the ids and texts of `documents`.
///
/// Any change to the corpus changes the digest, which invalidates stored
/// index snapshots.
pub fn corpus_version(documents: &[Document]) -> String {
    let mut hasher = Sha256::new();
    for document in documents {
        hasher.update(document.id.as_bytes());
        hasher.update([0u8]);
        hasher.update(document.text.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}
