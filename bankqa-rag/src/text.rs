//! Word tokenization shared by lexical scoring, the hashing encoder, and
//! answer metrics.

use std::collections::BTreeSet;

/// English function words ignored when extracting query keywords.
const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "am", "an", "and", "any", "are", "as", "at", "be",
    "been", "before", "being", "but", "by", "can", "could", "did", "do", "does", "for", "from",
    "had", "has", "have", "how", "i", "if", "in", "into", "is", "it", "its", "me", "my", "no",
    "not", "of", "on", "or", "our", "should", "so", "than", "that", "the", "their", "them",
    "then", "there", "these", "they", "this", "those", "to", "under", "up", "was", "we", "were",
    "what", "when", "where", "which", "who", "why", "will", "with", "would", "you", "your",
];

/// Return `true` if `word` (already lower-cased) is an English stop-word.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.binary_search(&word).is_ok()
}

/// Split text into lower-cased word tokens.
///
/// Every non-alphanumeric character is a separator, so `"two-factor"` gives
/// `["two", "factor"]` and `"$2,500"` gives `["2", "500"]`. Duplicates are
/// kept.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|piece| !piece.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Distinct non-stop-word tokens of `text`, in sorted order.
pub fn keywords(text: &str) -> BTreeSet<String> {
    tokenize(text).into_iter().filter(|t| !is_stop_word(t)).collect()
}
