//! Property tests for sequence normalization and aggregation.

use std::collections::HashMap;

use proptest::prelude::*;
use subpulse::classifier::vocabulary::DEFAULT_FILTERS;
use subpulse::classifier::{normalize, OovPolicy, SequenceShape, Side, Vocabulary, PAD_ID};
use subpulse::models::Sentiment;
use subpulse::services::aggregate_labels;

fn vocabulary() -> Vocabulary {
    let words = ["the", "good", "bad", "post", "is", "not", "very", "a"];
    let index: HashMap<String, u32> = words
        .iter()
        .enumerate()
        .map(|(i, w)| (w.to_string(), i as u32 + 2))
        .collect();
    Vocabulary::new(
        index,
        OovPolicy::MapTo(1),
        None,
        true,
        DEFAULT_FILTERS,
        " ".to_string(),
    )
    .unwrap()
}

fn side() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Pre), Just(Side::Post)]
}

fn sentiment() -> impl Strategy<Value = Sentiment> {
    prop_oneof![
        Just(Sentiment::Negative),
        Just(Sentiment::Neutral),
        Just(Sentiment::Positive),
    ]
}

proptest! {
    #[test]
    fn normalized_length_is_always_max_len(
        text in "[a-zA-Z ,.!?]{0,200}",
        max_len in 1usize..64,
        padding in side(),
        truncating in side(),
    ) {
        let shape = SequenceShape { max_len, padding, truncating };
        let tokens = vocabulary().tokenize(&text);
        prop_assert_eq!(normalize(&tokens, &shape).len(), max_len);
    }

    #[test]
    fn short_sequences_keep_every_token(
        tokens in prop::collection::vec(1u32..50, 0..20),
        padding in side(),
    ) {
        let shape = SequenceShape { max_len: 20, padding, truncating: Side::Pre };
        let padded = normalize(&tokens, &shape);
        let kept: Vec<u32> = padded.as_slice().iter().copied().filter(|&t| t != PAD_ID).collect();
        prop_assert_eq!(kept, tokens);
    }

    #[test]
    fn oov_words_always_map_to_reserved_id(word in "[q-z]{12,16}") {
        prop_assert_eq!(vocabulary().tokenize(&word), vec![1]);
    }

    #[test]
    fn aggregate_counts_and_percentages_add_up(
        labels in prop::collection::vec(sentiment(), 1..300),
    ) {
        let report = aggregate_labels(labels.iter().copied()).unwrap();
        prop_assert_eq!(report.total, labels.len());

        let counted: usize = Sentiment::ALL.iter().map(|&l| report.count(l)).sum();
        prop_assert_eq!(counted, labels.len());

        let share: f64 = Sentiment::ALL.iter().map(|&l| report.percentage(l)).sum();
        prop_assert!((share - 100.0).abs() <= 0.2, "percentages sum to {}", share);

        let max = Sentiment::ALL.iter().map(|&l| report.count(l)).max().unwrap();
        prop_assert_eq!(report.count(report.dominant), max);
    }
}
