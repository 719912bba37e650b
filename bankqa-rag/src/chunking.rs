//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`RecursiveChunker`], which
//! splits text at the best available separator (paragraph break, line break,
//! space) and falls back to a hard character cut when none fits.

use tracing::debug;

use crate::config::RagConfig;
use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};

/// Separators tried in priority order when closing a chunk.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// A strategy for splitting documents into chunks.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text. Chunks are
    /// returned in document order.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text hierarchically with a character budget and overlap.
///
/// Text is accumulated greedily up to `max_chars` characters. The chunk is
/// closed after the last paragraph break inside the budget, or failing that
/// the last line break, or the last space; if none of those leaves more than
/// `overlap_chars` characters in the chunk, it is cut at exactly `max_chars`.
/// The next chunk starts `overlap_chars` characters before the previous end.
///
/// Every chunk is an exact substring of the document, so dropping the
/// overlapping prefix of each chunk after the first and concatenating
/// reconstructs the original text.
///
/// # Example
///
/// ```rust,ignore
/// use bankqa_rag::{Chunker, RecursiveChunker};
///
/// let chunker = RecursiveChunker::new(800, 100)?;
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    max_chars: usize,
    overlap_chars: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `max_chars == 0` or
    /// `overlap_chars >= max_chars`.
    pub fn new(max_chars: usize, overlap_chars: usize) -> Result<Self> {
        if max_chars == 0 {
            return Err(RagError::Config("max_chars must be greater than zero".to_string()));
        }
        if overlap_chars >= max_chars {
            return Err(RagError::Config(format!(
                "overlap_chars ({overlap_chars}) must be less than max_chars ({max_chars})"
            )));
        }
        Ok(Self { max_chars, overlap_chars })
    }

    /// Create a chunker from the `chunk_size` and `chunk_overlap` of a config.
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Maximum chunk length in characters.
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Overlap between consecutive chunks in characters.
    pub fn overlap_chars(&self) -> usize {
        self.overlap_chars
    }

    /// Compute `(start, end)` byte spans for the chunks of `text`.
    fn spans(&self, text: &str) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        if text.is_empty() {
            return spans;
        }

        let mut start = 0;
        loop {
            // Byte position of the first character past the budget, if any.
            let Some(limit) = text[start..].char_indices().nth(self.max_chars).map(|(i, _)| start + i)
            else {
                spans.push((start, text.len()));
                break;
            };

            let end = self.find_break(text, start, limit);
            spans.push((start, end));
            start = back_up(text, end, self.overlap_chars);
        }

        spans
    }

    /// Pick the end of a chunk starting at `start` whose hard limit is `limit`.
    ///
    /// A separator break is only accepted if the chunk keeps more than
    /// `overlap_chars` characters, which guarantees the next chunk starts
    /// strictly after this one.
    fn find_break(&self, text: &str, start: usize, limit: usize) -> usize {
        let window = &text[start..limit];
        for separator in SEPARATORS {
            if let Some(pos) = window.rfind(separator) {
                let end = start + pos + separator.len();
                if text[start..end].chars().count() > self.overlap_chars {
                    return end;
                }
            }
        }
        limit
    }
}

/// Byte position `overlap` characters before `end`, bounded at zero.
fn back_up(text: &str, end: usize, overlap: usize) -> usize {
    if overlap == 0 {
        return end;
    }
    text[..end].char_indices().rev().nth(overlap - 1).map(|(i, _)| i).unwrap_or(0)
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = self
            .spans(&document.text)
            .into_iter()
            .enumerate()
            .map(|(i, (start, end))| Chunk {
                id: format!("{}_{i}", document.id),
                document_id: document.id.clone(),
                text: document.text[start..end].to_string(),
                start_offset: start,
                end_offset: end,
            })
            .collect();

        debug!(document.id = %document.id, chunk_count = chunks.len(), "chunked document");
        chunks
    }
}

/// Rebuild a document's text from its chunks by dropping overlapping prefixes.
///
/// Chunks must be in document order and come from a single document.
pub fn reconstruct(chunks: &[Chunk]) -> String {
    let mut text = String::new();
    let mut covered = 0usize;
    for chunk in chunks {
        let skip = covered.saturating_sub(chunk.start_offset).min(chunk.text.len());
        text.push_str(&chunk.text[skip..]);
        covered = covered.max(chunk.end_offset);
    }
    text
}
