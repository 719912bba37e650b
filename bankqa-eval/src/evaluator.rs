//! Batch evaluation of an [`AnswerPipeline`] against reference answers.

use std::time::Instant;

use bankqa_rag::{AnswerPipeline, AnswerRecord, RagError, cosine_similarity};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::case::EvaluationCase;
use crate::config::{EvalConfig, PassGate};
use crate::error::Result;
use crate::metrics::{RetrievalMetrics, keyword_accuracy, length_ratio, token_overlap, word_count};
use crate::report::{CaseResult, EvaluationReport, EvaluationScore};

/// Runs evaluation cases through a pipeline and aggregates their scores.
///
/// Cases run concurrently, up to [`EvalConfig::concurrency`] at a time. A
/// case whose generation fails or exceeds the per-case timeout is recorded
/// with zero scores; it never aborts the batch.
///
/// # Example
///
/// ```rust,ignore
/// use bankqa_eval::{EvalConfig, Evaluator, banking_cases};
///
/// let evaluator = Evaluator::new(EvalConfig::default())?;
/// let report = evaluator.evaluate(&banking_cases(), &pipeline).await;
/// println!("{report}");
/// ```
#[derive(Debug, Clone)]
pub struct Evaluator {
    config: EvalConfig,
}

struct Scored {
    record: AnswerRecord,
    score: EvaluationScore,
}

impl Evaluator {
    /// Create an evaluator, validating `config`.
    pub fn new(config: EvalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The validated configuration this evaluator runs with.
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Evaluate every case against `pipeline`.
    ///
    /// The report lists cases in input order regardless of completion order.
    pub async fn evaluate(
        &self,
        cases: &[EvaluationCase],
        pipeline: &AnswerPipeline,
    ) -> EvaluationReport {
        let started = Instant::now();
        info!(
            case_count = cases.len(),
            concurrency = self.config.concurrency,
            "starting evaluation"
        );

        let results: Vec<CaseResult> = stream::iter(cases.iter().enumerate())
            .map(|(index, case)| self.run_case(index, case, pipeline))
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await;

        let report = EvaluationReport::from_cases(results);
        info!(
            total = report.total_cases,
            passed = report.passed_cases,
            failed = report.failed_cases,
            mean_f1 = report.mean_f1,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "evaluation completed"
        );
        report
    }

    async fn run_case(
        &self,
        index: usize,
        case: &EvaluationCase,
        pipeline: &AnswerPipeline,
    ) -> CaseResult {
        let attempt = self.score_case(case, pipeline);
        let outcome = match self.config.case_timeout() {
            Some(limit) => match tokio::time::timeout(limit, attempt).await {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(_) => Err(format!("case timed out after {} ms", limit.as_millis())),
            },
            None => attempt.await.map_err(|e| e.to_string()),
        };

        match outcome {
            Ok(Scored { record, score }) => {
                debug!(index, f1 = score.f1, passed = score.passed, "case scored");
                CaseResult {
                    index,
                    question: case.question.clone(),
                    category: case.category.clone(),
                    retrieval: RetrievalMetrics::compute(
                        &record.retrieved_chunks,
                        &case.expected_keywords,
                    ),
                    answer: Some(record.generated_answer),
                    citations: record.citations,
                    score,
                    error: None,
                }
            }
            Err(message) => {
                warn!(index, question = %case.question, error = %message, "case failed");
                CaseResult {
                    index,
                    question: case.question.clone(),
                    category: case.category.clone(),
                    answer: None,
                    citations: Vec::new(),
                    score: EvaluationScore::default(),
                    retrieval: RetrievalMetrics::default(),
                    error: Some(message),
                }
            }
        }
    }

    async fn score_case(
        &self,
        case: &EvaluationCase,
        pipeline: &AnswerPipeline,
    ) -> std::result::Result<Scored, RagError> {
        let record = pipeline.answer(&case.question).await?;
        let overlap = token_overlap(&record.generated_answer, &case.reference_answer);
        let similarity =
            answer_similarity(pipeline, &record.generated_answer, &case.reference_answer).await?;
        let keyword_accuracy = keyword_accuracy(&record.generated_answer, &case.expected_keywords);

        let score = EvaluationScore {
            f1: overlap.f1,
            precision: overlap.precision,
            recall: overlap.recall,
            similarity,
            keyword_accuracy,
            answer_words: word_count(&record.generated_answer),
            reference_words: word_count(&case.reference_answer),
            length_ratio: length_ratio(&record.generated_answer, &case.reference_answer),
            passed: self.passes(overlap.f1, similarity, keyword_accuracy),
        };
        Ok(Scored { record, score })
    }

    fn passes(&self, f1: f64, similarity: f64, keyword_accuracy: f64) -> bool {
        let threshold = self.config.pass_threshold;
        match self.config.pass_gate {
            PassGate::F1 => f1 >= threshold,
            PassGate::AllMetrics => {
                f1 >= threshold && similarity >= threshold && keyword_accuracy >= threshold
            }
        }
    }
}

/// Cosine similarity of the answer and reference under the index's encoder.
async fn answer_similarity(
    pipeline: &AnswerPipeline,
    answer: &str,
    reference: &str,
) -> std::result::Result<f64, RagError> {
    let vectors = pipeline.retriever().encoder().embed_batch(&[answer, reference]).await?;
    match vectors.as_slice() {
        [a, b] => Ok(f64::from(cosine_similarity(a, b))),
        _ => Err(RagError::Embedding {
            provider: pipeline.retriever().encoder().model_id().to_string(),
            message: format!("expected 2 embeddings, got {}", vectors.len()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator(gate: PassGate) -> Evaluator {
        Evaluator::new(EvalConfig::builder().pass_gate(gate).build().unwrap()).unwrap()
    }

    #[test]
    fn f1_gate_ignores_other_metrics() {
        let e = evaluator(PassGate::F1);
        assert!(e.passes(0.5, 0.0, 0.0));
        assert!(!e.passes(0.49, 1.0, 1.0));
    }

    #[test]
    fn all_metrics_gate_requires_every_metric() {
        let e = evaluator(PassGate::AllMetrics);
        assert!(e.passes(0.6, 0.6, 0.6));
        assert!(!e.passes(0.6, 0.4, 1.0));
    }

    #[test]
    fn rejects_invalid_config() {
        let config = EvalConfig { concurrency: 0, ..EvalConfig::default() };
        assert!(Evaluator::new(config).is_err());
    }
}
