use std::collections::BTreeSet;

use bankqa_eval::{f1_score, keyword_accuracy, token_overlap};
use proptest::prelude::*;

fn words() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-zA-Z0-9$,.]{1,8}", 0..12).prop_map(|w| w.join(" "))
}

proptest! {
    #[test]
    fn f1_is_bounded(generated in words(), reference in words()) {
        let overlap = token_overlap(&generated, &reference);
        prop_assert!((0.0..=1.0).contains(&overlap.f1));
        prop_assert!((0.0..=1.0).contains(&overlap.precision));
        prop_assert!((0.0..=1.0).contains(&overlap.recall));
    }

    #[test]
    fn f1_is_symmetric(a in words(), b in words()) {
        prop_assert!((f1_score(&a, &b) - f1_score(&b, &a)).abs() < 1e-12);
    }

    #[test]
    fn identical_alphanumeric_text_scores_one(text in "[a-z0-9]{1,6}( [a-z0-9]{1,6}){0,8}") {
        prop_assert_eq!(f1_score(&text, &text.to_uppercase()), 1.0);
    }

    #[test]
    fn keywords_drawn_from_the_text_are_all_found(text in "[a-z]{1,6}( [a-z]{1,6}){0,8}") {
        let keywords: BTreeSet<String> =
            text.split_whitespace().map(|w| w.to_uppercase()).collect();
        prop_assert_eq!(keyword_accuracy(&text, &keywords), 1.0);
    }
}
