use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use proptest::prelude::*;

use rbs::Result;
use rbs::scoring::{CacheKey, QuantifierSettings, RewardQuantifier, ScoreScale};

proptest! {
    #[test]
    fn test_cache_key_is_stable_hex(text in ".*") {
        let first = CacheKey::for_text(&text);
        let second = CacheKey::for_text(&text);
        prop_assert_eq!(first.as_str(), second.as_str());
        prop_assert_eq!(first.as_str().len(), 64);
        prop_assert!(first.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_in_range_integers_parse(score in 1i64..=100, pad in "[ \t\n]{0,3}") {
        let raw = format!("{pad}{score}{pad}");
        prop_assert_eq!(ScoreScale::default().parse(&raw).unwrap(), score as f64);
    }

    #[test]
    fn test_out_of_range_scores_are_rejected(score in prop_oneof![-1000i64..1, 101i64..1000]) {
        prop_assert!(ScoreScale::default().parse(&score.to_string()).is_err());
    }

    #[test]
    fn test_parse_never_panics(raw in ".*") {
        let _ = ScoreScale::default().parse(&raw);
    }

    #[test]
    fn test_repeated_text_is_scored_once(texts in prop::collection::vec("[a-c]{1,3}", 1..40)) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let quantifier = RewardQuantifier::new(
            Arc::new(move |review: &str| -> Result<String> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok((review.len() * 10).to_string())
            }),
            QuantifierSettings::default(),
        );
        let mut distinct = std::collections::HashSet::new();
        for text in &texts {
            let score = quantifier.score(text).unwrap();
            prop_assert_eq!(score, (text.len() * 10) as f64);
            distinct.insert(text.clone());
        }
        prop_assert_eq!(calls.load(Ordering::SeqCst), distinct.len());
    }
}
