//! Answer pipeline orchestrator.
//!
//! The [`AnswerPipeline`] retrieves context for a question, packs it into a
//! prompt within a character budget, and delegates generation to a
//! [`TextGenerator`].
//!
//! # Example
//!
//! ```rust,ignore
//! use bankqa_rag::{AnswerPipeline, ExtractiveGenerator, RagConfig};
//!
//! let pipeline = AnswerPipeline::builder()
//!     .config(RagConfig::default())
//!     .retriever(Arc::new(retriever))
//!     .generator(Arc::new(ExtractiveGenerator::default()))
//!     .build()?;
//!
//! let record = pipeline.answer("What is the daily Zelle limit?").await?;
//! ```

use std::sync::Arc;

use tracing::{error, info};

use crate::config::{RagConfig, RetrievalMode};
use crate::document::{AnswerRecord, SearchResult};
use crate::error::{RagError, Result};
use crate::generation::{DEFAULT_SYSTEM_PROMPT, Prompt, TextGenerator};
use crate::retriever::Retriever;

/// Separator placed between chunks in the prompt context.
const CONTEXT_SEPARATOR: &str = "\n\n";

/// Retrieval followed by generation for a single question.
///
/// Construct one via [`AnswerPipeline::builder()`]. The pipeline holds no
/// mutable state and can be shared across tasks.
pub struct AnswerPipeline {
    config: RagConfig,
    retriever: Arc<Retriever>,
    generator: Arc<dyn TextGenerator>,
    system_prompt: String,
}

impl AnswerPipeline {
    /// Create a new [`AnswerPipelineBuilder`].
    pub fn builder() -> AnswerPipelineBuilder {
        AnswerPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the retriever.
    pub fn retriever(&self) -> &Arc<Retriever> {
        &self.retriever
    }

    /// Answer `question` using the configured `top_k` and retrieval mode.
    ///
    /// # Errors
    ///
    /// Propagates retrieval errors unchanged and returns
    /// [`RagError::GenerationUnavailable`] if the generator fails.
    pub async fn answer(&self, question: &str) -> Result<AnswerRecord> {
        self.answer_with(question, self.config.top_k, self.config.retrieval_mode).await
    }

    /// Answer `question` with an explicit `top_k` and retrieval mode.
    pub async fn answer_with(
        &self,
        question: &str,
        top_k: usize,
        mode: RetrievalMode,
    ) -> Result<AnswerRecord> {
        // 1. Retrieve context
        let retrieved = self.retriever.retrieve(question, top_k, mode).await?;

        // 2. Pack the highest-ranked chunks into the budget
        let (context, citations) = build_context(&retrieved, self.config.context_budget);
        let prompt = Prompt::new(self.system_prompt.as_str(), context, question);

        // 3. Generate
        let generated_answer = self.generator.generate(&prompt).await.map_err(|e| {
            error!(generator = self.generator.name(), error = %e, "generation failed");
            match e {
                RagError::GenerationUnavailable { .. } => e,
                other => RagError::GenerationUnavailable {
                    generator: self.generator.name().to_string(),
                    message: other.to_string(),
                },
            }
        })?;

        info!(
            retrieved = retrieved.len(),
            cited = citations.len(),
            answer_len = generated_answer.len(),
            "answered question"
        );

        Ok(AnswerRecord {
            question: question.to_string(),
            retrieved_chunks: retrieved,
            generated_answer,
            citations,
        })
    }
}

/// Concatenate chunk texts in rank order without exceeding `budget` characters.
///
/// Returns the context and the ids of every chunk that contributed to it. A
/// chunk that only partly fits is truncated and packing stops there.
pub fn build_context(results: &[SearchResult], budget: usize) -> (String, Vec<String>) {
    let mut context = String::new();
    let mut used = 0;
    let mut citations = Vec::new();

    for result in results {
        let separator = if context.is_empty() { 0 } else { CONTEXT_SEPARATOR.len() };
        let remaining = budget.saturating_sub(used + separator);
        if remaining == 0 {
            break;
        }
        if separator > 0 {
            context.push_str(CONTEXT_SEPARATOR);
            used += separator;
        }

        let text = &result.chunk.text;
        let length = text.chars().count();
        if length <= remaining {
            context.push_str(text);
            used += length;
            citations.push(result.chunk.id.clone());
        } else {
            context.extend(text.chars().take(remaining));
            citations.push(result.chunk.id.clone());
            break;
        }
    }

    (context, citations)
}

/// Builder for constructing an [`AnswerPipeline`].
///
/// `retriever` and `generator` are required. Without `config` the pipeline
/// uses [`RagConfig::default`] with the retriever's weights and threshold.
/// The system prompt defaults to [`DEFAULT_SYSTEM_PROMPT`].
#[derive(Default)]
pub struct AnswerPipelineBuilder {
    config: Option<RagConfig>,
    retriever: Option<Arc<Retriever>>,
    generator: Option<Arc<dyn TextGenerator>>,
    system_prompt: Option<String>,
}

impl AnswerPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the retriever.
    pub fn retriever(mut self, retriever: Arc<Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Set the text generator.
    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Override the system instruction.
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Build the [`AnswerPipeline`], validating the configuration and that
    /// all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required field is missing, the
    /// configuration is invalid, or its hybrid weights or similarity threshold
    /// differ from the retriever's.
    pub fn build(self) -> Result<AnswerPipeline> {
        if let Some(config) = &self.config {
            config.validate()?;
        }
        let retriever =
            self.retriever.ok_or_else(|| RagError::Config("retriever is required".to_string()))?;
        let generator =
            self.generator.ok_or_else(|| RagError::Config("generator is required".to_string()))?;
        let config = match self.config {
            Some(config) => {
                retriever.ensure_scoring(&config)?;
                config
            }
            None => retriever.scoring_config(),
        };

        Ok(AnswerPipeline {
            config,
            retriever,
            generator,
            system_prompt: self.system_prompt.unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        })
    }
}
