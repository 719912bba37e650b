//! Data types for documents, chunks, and search results.

use serde::{Deserialize, Serialize};

/// A source document. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The raw text content of the document.
    pub text: String,
    /// Identifier of the original source (file path, URI, ...).
    pub source: String,
}

impl Document {
    /// Create a document from its parts.
    pub fn new(id: impl Into<String>, text: impl Into<String>, source: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), source: source.into() }
    }
}

/// A contiguous segment of a [`Document`].
///
/// `text` is always `document.text[start_offset..end_offset]`; offsets are
/// byte positions on `char` boundaries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Unique identifier for the chunk, `{document_id}_{index}`.
    pub id: String,
    /// The ID of the parent [`Document`].
    pub document_id: String,
    /// The text content of the chunk.
    pub text: String,
    /// Byte offset of the first character in the parent document.
    pub start_offset: usize,
    /// Byte offset one past the last character in the parent document.
    pub end_offset: usize,
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// Ranked search results, at most `top_k` long and non-increasing by score.
pub type RetrievalResult = Vec<SearchResult>;

/// The outcome of answering a single question.
///
/// Produced per query and not persisted by this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// The question that was asked.
    pub question: String,
    /// The chunks retrieved as context, in rank order.
    pub retrieved_chunks: RetrievalResult,
    /// The text returned by the generator.
    pub generated_answer: String,
    /// IDs of the chunks that were included in the prompt context.
    pub citations: Vec<String>,
}
