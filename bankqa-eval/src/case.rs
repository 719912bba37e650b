//! Evaluation cases and the built-in banking ground truth.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A question with its reference answer and the keywords a good answer mentions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvaluationCase {
    pub question: String,
    pub reference_answer: String,
    #[serde(default)]
    pub expected_keywords: BTreeSet<String>,
    /// Optional grouping used for the per-category breakdown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl EvaluationCase {
    /// Create a case without a category.
    pub fn new<I, S>(question: impl Into<String>, reference_answer: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            question: question.into(),
            reference_answer: reference_answer.into(),
            expected_keywords: keywords.into_iter().map(Into::into).collect(),
            category: None,
        }
    }

    /// Attach a category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Read cases from a JSON array.
pub fn load_cases(path: impl AsRef<Path>) -> Result<Vec<EvaluationCase>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write cases as a pretty-printed JSON array.
pub fn save_cases(path: impl AsRef<Path>, cases: &[EvaluationCase]) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(cases)?)?;
    Ok(())
}

/// Ground truth for the Online Banking Service Agreement corpus.
pub fn banking_cases() -> Vec<EvaluationCase> {
    vec![
        EvaluationCase::new(
            "What is the Zelle transfer limit for new users?",
            "For new Consumer users with Zelle enrollment <= 15 days: $500 daily, $1,000 weekly, \
             $2,000 monthly. For new Small Business users: $2,000 daily, $45,000 weekly, $60,000 \
             monthly.",
            ["zelle", "transfer", "limit", "new", "users", "500", "1000", "2000", "consumer", "business"],
        )
        .with_category("transfer_limits"),
        EvaluationCase::new(
            "How do I cancel a scheduled bill payment?",
            "You can cancel through the payment activity section on the website or call \
             800.432.1000 for consumer accounts or 866.758.5972 for small business accounts.",
            ["cancel", "bill", "payment", "scheduled", "800.432.1000", "activity", "section"],
        )
        .with_category("payment_management"),
        EvaluationCase::new(
            "What is the cut-off time for domestic wire transfers?",
            "The cut-off time for Same Business Day domestic wire transfers is 5:00 PM Eastern Time.",
            ["cut-off", "time", "domestic", "wire", "transfer", "5:00", "pm", "eastern"],
        )
        .with_category("wire_transfers"),
        EvaluationCase::new(
            "What are the fees for international wire transfers?",
            "International wire transfers sent in US Dollars cost $45.00. There is no fee for \
             transfers sent in foreign currency, but exchange rate markups apply.",
            ["fees", "international", "wire", "transfer", "45.00", "dollar", "foreign", "currency"],
        )
        .with_category("fees"),
        EvaluationCase::new(
            "How do I enroll in online banking?",
            "You need to access the service using your User ID and password, along with any other \
             security methods required by the bank.",
            ["enroll", "online", "banking", "user", "id", "password", "security"],
        )
        .with_category("enrollment"),
        EvaluationCase::new(
            "What is the minimum Zelle transfer amount?",
            "The minimum transfer amount for any single Zelle transfer is $1.00.",
            ["minimum", "zelle", "transfer", "amount", "1.00"],
        )
        .with_category("transfer_limits"),
        EvaluationCase::new(
            "What are the daily limits for Zelle after 60 days?",
            "For Consumer users after 60+ days: $3,500 daily. For Small Business users after 60+ \
             days: $8,000 daily.",
            ["daily", "limits", "zelle", "60", "days", "3500", "8000", "consumer", "business"],
        )
        .with_category("transfer_limits"),
        EvaluationCase::new(
            "Can I cancel a one-time immediate payment?",
            "A one-time immediate payment cannot be canceled after it has been submitted.",
            ["cancel", "one-time", "immediate", "payment", "cannot", "submitted"],
        )
        .with_category("payment_management"),
        EvaluationCase::new(
            "What is the fee for domestic wire transfers?",
            "Domestic wire transfers cost $30.00 for both Consumer and Small Business accounts.",
            ["fee", "domestic", "wire", "transfer", "30.00", "consumer", "business"],
        )
        .with_category("fees"),
        EvaluationCase::new(
            "What are the security requirements for online banking?",
            "You need a User ID, password, and any other security methods required by the bank \
             such as security questions or one-time passcodes.",
            [
                "security",
                "requirements",
                "online",
                "banking",
                "user",
                "id",
                "password",
                "questions",
                "passcodes",
            ],
        )
        .with_category("security"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banking_cases_are_complete() {
        let cases = banking_cases();
        assert_eq!(cases.len(), 10);
        assert!(cases.iter().all(|c| !c.expected_keywords.is_empty() && c.category.is_some()));
    }

    #[test]
    fn cases_round_trip_through_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cases.json");
        save_cases(&path, &banking_cases()).unwrap();
        assert_eq!(load_cases(&path).unwrap(), banking_cases());
    }

    #[test]
    fn keywords_default_to_empty() {
        let case: EvaluationCase =
            serde_json::from_str(r#"{"question":"q","reference_answer":"a"}"#).unwrap();
        assert!(case.expected_keywords.is_empty());
        assert!(case.category.is_none());
    }
}
