//! Per-case scores and the aggregate evaluation report.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::metrics::{RetrievalMetrics, mean};

/// Scores for one case.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct EvaluationScore {
    pub f1: f64,
    pub precision: f64,
    pub recall: f64,
    /// Cosine similarity between answer and reference embeddings.
    pub similarity: f64,
    pub keyword_accuracy: f64,
    /// Words in the generated answer.
    #[serde(default)]
    pub answer_words: usize,
    /// Words in the reference answer.
    #[serde(default)]
    pub reference_words: usize,
    /// `answer_words / reference_words`, 0 when the reference is empty.
    #[serde(default)]
    pub length_ratio: f64,
    pub passed: bool,
}

/// The outcome of one case, kept in input order in the report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseResult {
    /// Position of the case in the input.
    pub index: usize,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// The generated answer, absent when the case failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default)]
    pub citations: Vec<String>,
    pub score: EvaluationScore,
    pub retrieval: RetrievalMetrics,
    /// Why the case failed, if it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CaseResult {
    /// Whether the case could not be run to completion.
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Aggregates for the cases sharing a category.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CategoryMetrics {
    pub case_count: usize,
    pub passed_cases: usize,
    pub mean_f1: f64,
    pub mean_similarity: f64,
    pub mean_keyword_accuracy: f64,
    pub mean_retrieval_similarity: f64,
}

/// Qualitative band for a mean score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 0.7 => Self::Excellent,
            s if s >= 0.5 => Self::Good,
            s if s >= 0.3 => Self::Fair,
            _ => Self::Poor,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Excellent => "EXCELLENT",
            Self::Good => "GOOD",
            Self::Fair => "FAIR",
            Self::Poor => "POOR",
        };
        f.write_str(label)
    }
}

/// The result of one evaluation run.
///
/// Means are taken over every case, with failed cases contributing zeros.
/// `cases` is ordered by input position so reports from repeated runs diff
/// cleanly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationReport {
    pub generated_at: DateTime<Utc>,
    pub total_cases: usize,
    pub passed_cases: usize,
    /// Cases whose generation failed or timed out.
    pub failed_cases: usize,
    pub mean_f1: f64,
    pub mean_similarity: f64,
    pub mean_keyword_accuracy: f64,
    pub mean_retrieval_similarity: f64,
    pub retrieval_grade: Grade,
    pub answer_grade: Grade,
    pub categories: BTreeMap<String, CategoryMetrics>,
    pub cases: Vec<CaseResult>,
}

impl EvaluationReport {
    /// Aggregate case results. `cases` is sorted by input index first.
    pub fn from_cases(mut cases: Vec<CaseResult>) -> Self {
        cases.sort_by_key(|c| c.index);

        let mean_f1 = mean(cases.iter().map(|c| c.score.f1));
        let mean_retrieval_similarity = mean(cases.iter().map(|c| c.retrieval.avg_similarity));

        let mut grouped: BTreeMap<String, Vec<&CaseResult>> = BTreeMap::new();
        for case in &cases {
            if let Some(category) = &case.category {
                grouped.entry(category.clone()).or_default().push(case);
            }
        }
        let categories = grouped
            .into_iter()
            .map(|(name, members)| (name, summarize(&members)))
            .collect();

        Self {
            generated_at: Utc::now(),
            total_cases: cases.len(),
            passed_cases: cases.iter().filter(|c| c.score.passed).count(),
            failed_cases: cases.iter().filter(|c| c.is_failure()).count(),
            mean_f1,
            mean_similarity: mean(cases.iter().map(|c| c.score.similarity)),
            mean_keyword_accuracy: mean(cases.iter().map(|c| c.score.keyword_accuracy)),
            mean_retrieval_similarity,
            retrieval_grade: Grade::from_score(mean_retrieval_similarity),
            answer_grade: Grade::from_score(mean_f1),
            categories,
            cases,
        }
    }

    /// Write the report as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Read a report written by [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

fn summarize(members: &[&CaseResult]) -> CategoryMetrics {
    CategoryMetrics {
        case_count: members.len(),
        passed_cases: members.iter().filter(|c| c.score.passed).count(),
        mean_f1: mean(members.iter().map(|c| c.score.f1)),
        mean_similarity: mean(members.iter().map(|c| c.score.similarity)),
        mean_keyword_accuracy: mean(members.iter().map(|c| c.score.keyword_accuracy)),
        mean_retrieval_similarity: mean(members.iter().map(|c| c.retrieval.avg_similarity)),
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{rule}")?;
        writeln!(f, "RAG EVALUATION SUMMARY")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Total cases:            {}", self.total_cases)?;
        writeln!(f, "Passed:                 {}", self.passed_cases)?;
        writeln!(f, "Failed (errors):        {}", self.failed_cases)?;
        writeln!(f, "Mean F1:                {:.3}", self.mean_f1)?;
        writeln!(f, "Mean similarity:        {:.3}", self.mean_similarity)?;
        writeln!(f, "Mean keyword accuracy:  {:.3}", self.mean_keyword_accuracy)?;
        writeln!(f, "Mean retrieval score:   {:.3}", self.mean_retrieval_similarity)?;

        if !self.categories.is_empty() {
            writeln!(f)?;
            writeln!(f, "CATEGORY BREAKDOWN")?;
            writeln!(f, "{}", "-".repeat(40))?;
            for (name, metrics) in &self.categories {
                writeln!(
                    f,
                    "{:<20} cases={} passed={} f1={:.3} retrieval={:.3}",
                    name,
                    metrics.case_count,
                    metrics.passed_cases,
                    metrics.mean_f1,
                    metrics.mean_retrieval_similarity
                )?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Retrieval: {}", self.retrieval_grade)?;
        write!(f, "Answer quality: {}", self.answer_grade)
    }
}
