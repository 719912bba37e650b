//! Text generation boundary.
//!
//! The crate never generates text itself. A [`TextGenerator`] turns a
//! [`Prompt`] into an answer; failures are reported as
//! [`RagError::GenerationUnavailable`] and are not retried here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Instruction given to the generator ahead of every question.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions \
about the bank's Online Banking Service Agreement. Use only the provided context to answer \
questions. If the answer is not in the context, say 'I don't have enough information to \
answer that question.'";

/// A prompt split into a system instruction and a user message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Prompt {
    /// Standing instruction for the generator.
    pub system: String,
    /// The context block followed by the question.
    pub user: String,
    /// The context block on its own, for generators that only echo it.
    pub context: String,
}

impl Prompt {
    /// Build a prompt from an already budgeted context and a question.
    pub fn new(system: impl Into<String>, context: impl Into<String>, question: &str) -> Self {
        let context = context.into();
        let user = format!("Context:\n{context}\n\nQuestion: {question}");
        Self { system: system.into(), user, context }
    }
}

/// An external text-generation capability.
///
/// # Example
///
/// ```rust,ignore
/// use bankqa_rag::{Prompt, TextGenerator};
///
/// let answer = generator.generate(&prompt).await?;
/// ```
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce an answer for `prompt`.
    ///
    /// Implementations report every failure as
    /// [`RagError::GenerationUnavailable`](crate::RagError::GenerationUnavailable).
    async fn generate(&self, prompt: &Prompt) -> Result<String>;

    /// A short name for logs and error messages.
    fn name(&self) -> &str;
}

/// Answers with a leading excerpt of the retrieved context.
///
/// Works offline and is useful as a retrieval-only baseline: its answers
/// contain exactly what retrieval surfaced.
#[derive(Debug, Clone)]
pub struct ExtractiveGenerator {
    max_chars: usize,
}

impl ExtractiveGenerator {
    /// Create a generator that returns at most `max_chars` characters of context.
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

impl Default for ExtractiveGenerator {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[async_trait]
impl TextGenerator for ExtractiveGenerator {
    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        Ok(prompt.context.chars().take(self.max_chars).collect())
    }

    fn name(&self) -> &str {
        "extractive"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_wraps_context_and_question() {
        let prompt = Prompt::new("sys", "Fees are $30.", "What is the fee?");
        assert_eq!(prompt.user, "Context:\nFees are $30.\n\nQuestion: What is the fee?");
    }

    #[tokio::test]
    async fn extractive_generator_truncates_context() {
        let prompt = Prompt::new("sys", "abcdefghij", "q");
        let answer = ExtractiveGenerator::new(4).generate(&prompt).await.unwrap();
        assert_eq!(answer, "abcd");
    }
}
