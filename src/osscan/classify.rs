//! Classification of scored fingerprints into a bounded, deduplicated summary

use super::{OsClass, OsScanStatus, ScoredFingerprint};
use serde::{Deserialize, Serialize};

/// A distinct classification and the accuracy of the best print producing it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsClassMatch {
    pub class: OsClass,
    pub accuracy: f64,
}

/// Deduplicated classification summary for one host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationSummary {
    matches: Vec<OsClassMatch>,
    num_perfect_matches: usize,
    overall_status: OsScanStatus,
}

impl ClassificationSummary {
    fn empty(overall_status: OsScanStatus) -> Self {
        Self {
            matches: Vec::new(),
            num_perfect_matches: 0,
            overall_status,
        }
    }

    pub fn matches(&self) -> &[OsClassMatch] {
        &self.matches
    }

    pub fn num_matches(&self) -> usize {
        self.matches.len()
    }

    pub fn num_perfect_matches(&self) -> usize {
        self.num_perfect_matches
    }

    pub fn overall_status(&self) -> OsScanStatus {
        self.overall_status
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Highest-ranked classification, if any
    pub fn best(&self) -> Option<&OsClassMatch> {
        self.matches.first()
    }

    /// Distinct device types in rank order
    pub fn device_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = Vec::new();
        for m in &self.matches {
            if let Some(device_type) = m.class.device_type.as_deref() {
                if !types.contains(&device_type) {
                    types.push(device_type);
                }
            }
        }
        types
    }

    fn contains(&self, class: &OsClass) -> bool {
        self.matches.iter().any(|m| &m.class == class)
    }
}

/// Build a classification summary from prints ordered by decreasing accuracy.
///
/// `num_perfect` is the length of the perfect-match prefix of `prints`.
/// A store already flagged `TooManyMatches` yields an empty summary with the
/// same status. Once a perfect classification is held, classes from
/// non-perfect prints are not collected. Running out of room while a perfect
/// print still has unseen classes escalates to `TooManyMatches`; running out
/// on a non-perfect print just ends the summary.
pub fn classify(
    prints: &[ScoredFingerprint],
    num_perfect: usize,
    store_status: OsScanStatus,
    capacity: usize,
) -> ClassificationSummary {
    if store_status == OsScanStatus::TooManyMatches {
        // Matching already overflowed, so even the perfect matches are incomplete
        return ClassificationSummary::empty(OsScanStatus::TooManyMatches);
    }

    let mut summary = ClassificationSummary::empty(OsScanStatus::Success);

    'prints: for (printno, print) in prints.iter().enumerate() {
        let perfect = printno < num_perfect;

        for class in print.classes() {
            if summary.contains(class) {
                continue;
            }

            if summary.matches.len() >= capacity {
                if perfect {
                    log::debug!(
                        "Classification overflow at perfect print '{}' ({} classes)",
                        print.name(),
                        capacity
                    );
                    summary.overall_status = OsScanStatus::TooManyMatches;
                }
                break 'prints;
            }

            if summary.num_perfect_matches > 0 && !perfect {
                break 'prints;
            }

            summary.matches.push(OsClassMatch {
                class: class.clone(),
                accuracy: print.accuracy(),
            });
            if perfect {
                summary.num_perfect_matches += 1;
            }
        }
    }

    if summary.matches.is_empty() {
        summary.overall_status = OsScanStatus::NoMatches;
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(vendor: &str, generation: &str) -> OsClass {
        OsClass::new(Some(vendor), Some(vendor), Some("general purpose"), Some(generation))
    }

    fn print(name: &str, accuracy: f64, classes: Vec<OsClass>) -> ScoredFingerprint {
        ScoredFingerprint::new(name, accuracy, classes).unwrap()
    }

    #[test]
    fn test_empty_input_is_no_matches() {
        let summary = classify(&[], 0, OsScanStatus::Success, 36);
        assert_eq!(summary.overall_status(), OsScanStatus::NoMatches);
        assert!(summary.is_empty());
        assert_eq!(summary.num_perfect_matches(), 0);
    }

    #[test]
    fn test_too_many_matches_short_circuits() {
        let prints = vec![print("Linux", 1.0, vec![class("Linux", "5.X")])];
        let summary = classify(&prints, 1, OsScanStatus::TooManyMatches, 36);
        assert_eq!(summary.overall_status(), OsScanStatus::TooManyMatches);
        assert!(summary.is_empty());
    }

    #[test]
    fn test_duplicates_keep_first_accuracy() {
        let prints = vec![
            print("Linux 5.4", 0.95, vec![class("Linux", "5.X")]),
            print("Linux 5.10", 0.90, vec![class("Linux", "5.X")]),
        ];
        let summary = classify(&prints, 0, OsScanStatus::Success, 36);
        assert_eq!(summary.num_matches(), 1);
        assert_eq!(summary.matches()[0].accuracy, 0.95);
        assert_eq!(summary.overall_status(), OsScanStatus::Success);
    }

    #[test]
    fn test_duplicates_within_one_print() {
        let prints = vec![print(
            "Linux",
            0.9,
            vec![class("Linux", "5.X"), class("Linux", "5.X"), class("Linux", "4.X")],
        )];
        let summary = classify(&prints, 0, OsScanStatus::Success, 36);
        assert_eq!(summary.num_matches(), 2);
    }

    #[test]
    fn test_perfect_match_excludes_lesser() {
        let prints = vec![
            print("Linux 5.4", 1.0, vec![class("Linux", "5.X")]),
            print("FreeBSD 13", 0.8, vec![class("FreeBSD", "13.X")]),
        ];
        let summary = classify(&prints, 1, OsScanStatus::Success, 36);
        assert_eq!(summary.num_matches(), 1);
        assert_eq!(summary.num_perfect_matches(), 1);
        assert_eq!(summary.matches()[0].class, class("Linux", "5.X"));
    }

    #[test]
    fn test_non_perfect_prints_all_collected() {
        let prints = vec![
            print("Linux 5.4", 0.93, vec![class("Linux", "5.X")]),
            print("FreeBSD 13", 0.88, vec![class("FreeBSD", "13.X")]),
        ];
        let summary = classify(&prints, 0, OsScanStatus::Success, 36);
        assert_eq!(summary.num_matches(), 2);
        assert_eq!(summary.num_perfect_matches(), 0);
    }

    #[test]
    fn test_perfect_overflow_escalates() {
        let prints = vec![
            print("a", 1.0, vec![class("A", "1")]),
            print("b", 1.0, vec![class("B", "1")]),
            print("c", 1.0, vec![class("C", "1")]),
        ];
        let summary = classify(&prints, 3, OsScanStatus::Success, 2);
        assert_eq!(summary.overall_status(), OsScanStatus::TooManyMatches);
        assert_eq!(summary.num_matches(), 2);
        assert_eq!(summary.num_perfect_matches(), 2);
    }

    #[test]
    fn test_non_perfect_overflow_is_silent() {
        let prints = vec![
            print("a", 0.9, vec![class("A", "1")]),
            print("b", 0.9, vec![class("B", "1")]),
            print("c", 0.85, vec![class("C", "1")]),
        ];
        let summary = classify(&prints, 0, OsScanStatus::Success, 2);
        assert_eq!(summary.overall_status(), OsScanStatus::Success);
        assert_eq!(summary.num_matches(), 2);
    }

    #[test]
    fn test_full_summary_ignores_known_classes() {
        // A duplicate never counts as overflow, even when the summary is full
        let prints = vec![
            print("a", 1.0, vec![class("A", "1")]),
            print("b", 1.0, vec![class("B", "1")]),
            print("a2", 1.0, vec![class("A", "1")]),
        ];
        let summary = classify(&prints, 3, OsScanStatus::Success, 2);
        assert_eq!(summary.overall_status(), OsScanStatus::Success);
    }

    #[test]
    fn test_device_types_are_distinct() {
        let prints = vec![print(
            "mixed",
            0.9,
            vec![
                OsClass::new(Some("Cisco"), Some("IOS"), Some("router"), Some("12.X")),
                OsClass::new(Some("Cisco"), Some("IOS"), Some("switch"), Some("12.X")),
                OsClass::new(Some("Cisco"), Some("IOS"), Some("router"), Some("15.X")),
            ],
        )];
        let summary = classify(&prints, 0, OsScanStatus::Success, 36);
        assert_eq!(summary.device_types(), vec!["router", "switch"]);
        assert_eq!(summary.best().unwrap().class.generation.as_deref(), Some("12.X"));
    }
}
