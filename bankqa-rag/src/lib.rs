//! Retrieval core for answering questions over a fixed bank document corpus.
//!
//! This crate provides:
//! - [`RecursiveChunker`]: overlapping, separator-aware document chunking
//! - [`EmbeddingIndex`]: an immutable, encoder-tagged vector index with exact search
//! - [`Retriever`]: vector or hybrid (vector + lexical) ranking
//! - [`AnswerPipeline`]: context packing and delegation to a [`TextGenerator`]
//!
//! Embeddings and text generation are external capabilities behind the
//! [`EmbeddingProvider`] and [`TextGenerator`] traits. [`HashingEmbeddingProvider`]
//! and [`ExtractiveGenerator`] run fully offline; the `openai` feature adds
//! API-backed implementations.

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod hashing;
pub mod index;
pub mod pipeline;
pub mod retriever;
pub mod text;

#[cfg(feature = "openai")]
pub mod openai;

pub use chunking::{Chunker, RecursiveChunker, reconstruct};
pub use config::{RagConfig, RagConfigBuilder, RetrievalMode};
pub use document::{AnswerRecord, Chunk, Document, RetrievalResult, SearchResult};
pub use embedding::{EmbeddingProvider, EncoderInfo, cosine_similarity};
pub use error::{RagError, Result};
pub use generation::{DEFAULT_SYSTEM_PROMPT, ExtractiveGenerator, Prompt, TextGenerator};
pub use hashing::HashingEmbeddingProvider;
pub use index::{EmbeddingIndex, IndexedChunk, corpus_version};
pub use pipeline::{AnswerPipeline, AnswerPipelineBuilder, build_context};
pub use retriever::Retriever;
