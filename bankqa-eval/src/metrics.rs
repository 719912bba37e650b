//! Answer-quality and retrieval metrics.

use std::collections::{BTreeSet, HashMap};

use bankqa_rag::SearchResult;
use bankqa_rag::text::tokenize;
use serde::{Deserialize, Serialize};

/// Token-level precision, recall, and F1 of an answer against a reference.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct TokenOverlap {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Compare `generated` and `reference` as bags of lower-cased word tokens.
///
/// The intersection counts each token `min(count_generated, count_reference)`
/// times. All three values are 0 when either side has no tokens or there is
/// no overlap.
pub fn token_overlap(generated: &str, reference: &str) -> TokenOverlap {
    let generated = tokenize(generated);
    let reference = tokenize(reference);
    if generated.is_empty() || reference.is_empty() {
        return TokenOverlap::default();
    }

    let mut reference_counts: HashMap<&str, usize> = HashMap::new();
    for token in &reference {
        *reference_counts.entry(token.as_str()).or_default() += 1;
    }

    let mut common = 0usize;
    for token in &generated {
        if let Some(count) = reference_counts.get_mut(token.as_str()) {
            if *count > 0 {
                *count -= 1;
                common += 1;
            }
        }
    }

    let precision = common as f64 / generated.len() as f64;
    let recall = common as f64 / reference.len() as f64;
    if precision + recall == 0.0 {
        return TokenOverlap::default();
    }
    TokenOverlap { precision, recall, f1: 2.0 * precision * recall / (precision + recall) }
}

/// Token F1 of `generated` against `reference`.
pub fn f1_score(generated: &str, reference: &str) -> f64 {
    token_overlap(generated, reference).f1
}

/// Fraction of `keywords` appearing (case-insensitively) anywhere in `text`.
///
/// Returns 1.0 when `keywords` is empty.
pub fn keyword_accuracy(text: &str, keywords: &BTreeSet<String>) -> f64 {
    if keywords.is_empty() {
        return 1.0;
    }
    let haystack = text.to_lowercase();
    let found = keywords.iter().filter(|k| haystack.contains(&k.to_lowercase())).count();
    found as f64 / keywords.len() as f64
}

/// Number of whitespace-separated words in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Answer length over reference length, in words. 0 for an empty reference.
pub fn length_ratio(answer: &str, reference: &str) -> f64 {
    match word_count(reference) {
        0 => 0.0,
        reference_words => word_count(answer) as f64 / reference_words as f64,
    }
}

/// How well retrieval surfaced the material for a question.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct RetrievalMetrics {
    /// Mean score of the retrieved chunks.
    pub avg_similarity: f64,
    /// Best score among the retrieved chunks.
    pub max_similarity: f64,
    /// Fraction of expected keywords present in the retrieved text.
    pub keyword_coverage: f64,
}

impl RetrievalMetrics {
    /// Compute metrics for `results` against the case's expected keywords.
    ///
    /// An empty result scores 0 on both similarity fields.
    pub fn compute(results: &[SearchResult], keywords: &BTreeSet<String>) -> Self {
        if results.is_empty() {
            return Self { keyword_coverage: keyword_accuracy("", keywords), ..Self::default() };
        }
        let scores: Vec<f64> = results.iter().map(|r| f64::from(r.score)).collect();
        let avg_similarity = scores.iter().sum::<f64>() / scores.len() as f64;
        let max_similarity = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let text: Vec<&str> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        Self {
            avg_similarity,
            max_similarity,
            keyword_coverage: keyword_accuracy(&text.join(" "), keywords),
        }
    }
}

/// Arithmetic mean, 0 for an empty input.
pub(crate) fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values.into_iter().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn identical_text_scores_one() {
        let overlap = token_overlap("Domestic wires cost $30.00", "domestic WIRES cost $30.00!");
        assert_eq!(overlap.f1, 1.0);
        assert_eq!(overlap.precision, 1.0);
        assert_eq!(overlap.recall, 1.0);
    }

    #[test]
    fn hyphenated_reference_matches_spaced_answer() {
        // [wires, need, two, factor, authentication] vs [two, factor, authentication]
        let f1 = f1_score("Wires need two factor authentication", "two-factor authentication");
        assert!((f1 - 0.75).abs() < 1e-12);
    }

    #[test]
    fn length_ratio_counts_words() {
        assert_eq!(length_ratio("$2,500 per day for Zelle", "$2,500 per day"), 5.0 / 3.0);
        assert_eq!(length_ratio("anything", "   "), 0.0);
        assert_eq!(word_count("two-factor  authentication\n"), 2);
    }

    #[test]
    fn disjoint_text_scores_zero() {
        assert_eq!(f1_score("cancel online", "wire fee"), 0.0);
    }

    #[test]
    fn empty_side_scores_zero() {
        assert_eq!(f1_score("", "wire fee"), 0.0);
        assert_eq!(f1_score("wire fee", "?!"), 0.0);
    }

    #[test]
    fn repeated_tokens_count_as_a_bag() {
        // generated: [fee, fee, fee]; reference: [fee, wire]; common = 1.
        let overlap = token_overlap("fee fee fee", "fee wire");
        assert!((overlap.precision - 1.0 / 3.0).abs() < 1e-12);
        assert!((overlap.recall - 0.5).abs() < 1e-12);
        assert!((overlap.f1 - 0.4).abs() < 1e-12);
    }

    #[test]
    fn zelle_example_passes() {
        let answer = "$2,500 per day for Zelle transfers";
        assert!(f1_score(answer, "$2,500 per day") > 0.5);
        assert_eq!(keyword_accuracy(answer, &set(&["2,500", "Zelle"])), 1.0);
    }

    #[test]
    fn keyword_accuracy_is_fractional_and_case_insensitive() {
        let keywords = set(&["ZELLE", "limit", "wire", "fee"]);
        assert_eq!(keyword_accuracy("zelle LIMIT applies", &keywords), 0.5);
        assert_eq!(keyword_accuracy("anything", &BTreeSet::new()), 1.0);
    }

    #[test]
    fn retrieval_metrics_summarise_scores() {
        use bankqa_rag::Chunk;
        let result = |text: &str, score| SearchResult {
            chunk: Chunk {
                id: "c".into(),
                document_id: "d".into(),
                text: text.into(),
                start_offset: 0,
                end_offset: 0,
            },
            score,
        };
        let metrics = RetrievalMetrics::compute(
            &[result("Zelle limit", 0.75), result("wire fee", 0.25)],
            &set(&["zelle", "fee", "cut-off"]),
        );
        assert_eq!(metrics.avg_similarity, 0.5);
        assert_eq!(metrics.max_similarity, 0.75);
        assert!((metrics.keyword_coverage - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn mean_of_nothing_is_zero() {
        assert_eq!(mean(Vec::new()), 0.0);
        assert_eq!(mean(vec![1.0, 0.0]), 0.5);
    }
}
