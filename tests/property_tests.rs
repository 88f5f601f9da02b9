//! Property tests for the match store and classifier invariants

use fpresults::osscan::{classify, MAX_FP_RESULTS};
use fpresults::{FingerprintResults, OsClass, OsScanStatus, ScoredFingerprint};
use proptest::prelude::*;

fn arb_class() -> impl Strategy<Value = OsClass> {
    // Small alphabets so duplicates actually occur
    (
        proptest::option::of(prop_oneof![Just("Linux"), Just("Microsoft"), Just("Cisco")]),
        proptest::option::of(prop_oneof![Just("Linux"), Just("Windows"), Just("IOS")]),
        proptest::option::of(prop_oneof![Just("general purpose"), Just("router")]),
        proptest::option::of(prop_oneof![Just("1"), Just("2"), Just("3")]),
    )
        .prop_map(|(v, f, d, g)| OsClass::new(v, f, d, g))
}

/// Prints sorted by decreasing accuracy, perfect ones first
fn arb_prints() -> impl Strategy<Value = Vec<ScoredFingerprint>> {
    proptest::collection::vec(
        (
            prop_oneof![Just(1.0f64), 0.5f64..0.99],
            proptest::collection::vec(arb_class(), 1..4),
        ),
        0..12,
    )
    .prop_map(|mut raw| {
        raw.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());
        raw.into_iter()
            .enumerate()
            .map(|(i, (acc, classes))| ScoredFingerprint::new(format!("fp-{}", i), acc, classes).unwrap())
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_perfect_count_bounded(prints in arb_prints()) {
        let mut results = FingerprintResults::ipv4(prints.len());
        for p in prints {
            results.add_match(p).unwrap();
        }
        prop_assert!(results.num_perfect_matches() <= results.num_matches());
        prop_assert!(results.num_matches() <= results.capacity());
    }

    #[test]
    fn prop_summary_invariants(prints in arb_prints(), capacity in 1usize..6) {
        let num_perfect = prints.iter().take_while(|p| p.is_perfect()).count();
        let summary = classify(&prints, num_perfect, OsScanStatus::Success, capacity);

        prop_assert!(summary.num_matches() <= capacity);
        prop_assert!(summary.num_perfect_matches() <= summary.num_matches());

        // No duplicate labels
        for (i, a) in summary.matches().iter().enumerate() {
            for b in &summary.matches()[i + 1..] {
                prop_assert_ne!(&a.class, &b.class);
            }
        }

        // Once a perfect label is held, nothing non-perfect follows it
        if summary.num_perfect_matches() > 0 {
            prop_assert!(summary.matches().iter().all(|m| m.accuracy == 1.0));
        }

        match summary.overall_status() {
            OsScanStatus::NoMatches => prop_assert!(summary.is_empty()),
            OsScanStatus::Success => prop_assert!(!summary.is_empty()),
            OsScanStatus::TooManyMatches => {
                prop_assert_eq!(summary.num_matches(), capacity);
                prop_assert!(num_perfect > 0);
            }
        }
    }

    #[test]
    fn prop_classification_memoized(prints in arb_prints()) {
        let mut results = FingerprintResults::ipv4(prints.len().max(1));
        for p in prints {
            results.add_match(p).unwrap();
        }
        results.set_overall_status(OsScanStatus::Success);

        let first = results.classification().clone();
        prop_assert_eq!(results.classification(), &first);
        prop_assert!(first.num_matches() <= MAX_FP_RESULTS);
    }
}
