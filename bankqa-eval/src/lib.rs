//! Evaluation harness for the bank question-answering pipeline.
//!
//! Scores generated answers against reference answers with token F1,
//! embedding similarity, and keyword accuracy, and aggregates the results
//! into an [`EvaluationReport`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use bankqa_eval::{EvalConfig, Evaluator, banking_cases};
//!
//! let evaluator = Evaluator::new(EvalConfig::default())?;
//! let report = evaluator.evaluate(&banking_cases(), &pipeline).await;
//! println!("passed {}/{}", report.passed_cases, report.total_cases);
//! ```

pub mod case;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod metrics;
pub mod report;

pub use case::{EvaluationCase, banking_cases, load_cases, save_cases};
pub use config::{EvalConfig, EvalConfigBuilder, PassGate};
pub use error::{EvalError, Result};
pub use evaluator::Evaluator;
pub use metrics::{
    RetrievalMetrics, TokenOverlap, f1_score, keyword_accuracy, length_ratio, token_overlap,
    word_count,
};
pub use report::{CaseResult, CategoryMetrics, EvaluationReport, EvaluationScore, Grade};
