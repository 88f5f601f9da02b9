//! Per-host store of scored fingerprint matches and diagnostic facts

use super::classify::{classify, ClassificationSummary};
use super::gate::{self, RejectionReason};
use super::{AddressFamily, OsScanStatus, ScoredFingerprint, DISTANCE_UNKNOWN, MAX_FP_RESULTS};
use crate::config::ScanConfig;
use crate::FingerprintError;
use chrono::{DateTime, Utc};
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};

/// How the hop distance to the host was determined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMethod {
    #[default]
    None,
    Localhost,
    Direct,
    Icmp,
    Traceroute,
}

/// Facts about the probing of a host that bear on fingerprint quality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostDiagnostics {
    pub open_tcp_port: Option<u16>,
    pub closed_tcp_port: Option<u16>,
    pub closed_udp_port: Option<u16>,
    /// Hop count, or [`DISTANCE_UNKNOWN`]
    pub distance: i32,
    pub distance_guess: i32,
    pub distance_method: DistanceMethod,
    pub max_timing_ratio: f64,
    /// Some probes failed to send
    pub incomplete: bool,
}

impl Default for HostDiagnostics {
    fn default() -> Self {
        Self {
            open_tcp_port: None,
            closed_tcp_port: None,
            closed_udp_port: None,
            distance: DISTANCE_UNKNOWN,
            distance_guess: DISTANCE_UNKNOWN,
            distance_method: DistanceMethod::None,
            max_timing_ratio: 0.0,
            incomplete: false,
        }
    }
}

/// IPv6 probing session facts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ipv6Session {
    pub flow_label: u32,
    pub begin_time: Option<DateTime<Utc>>,
}

/// Scored fingerprint matches for a single host.
///
/// Matches must be added in order of decreasing accuracy with all perfect
/// matches first. The store appends up to its capacity and never reorders or
/// drops entries.
///
/// The classification summary is computed on the first call to
/// [`classification`](Self::classification) and cached for the lifetime of the
/// store; later calls return the cached summary even if more matches were
/// added in between. The cache is not `Sync`, so a store cannot be shared
/// between scan tasks.
#[derive(Debug)]
pub struct FingerprintResults {
    family: AddressFamily,
    capacity: usize,
    matches: Vec<ScoredFingerprint>,
    num_perfect_matches: usize,
    overall_status: OsScanStatus,
    diagnostics: HostDiagnostics,
    ipv6: Option<Ipv6Session>,
    classification: OnceCell<ClassificationSummary>,
}

impl FingerprintResults {
    fn new(family: AddressFamily, capacity: usize) -> Self {
        Self {
            family,
            capacity,
            matches: Vec::with_capacity(capacity),
            num_perfect_matches: 0,
            overall_status: OsScanStatus::NoMatches,
            diagnostics: HostDiagnostics::default(),
            ipv6: match family {
                AddressFamily::Ipv4 => None,
                AddressFamily::Ipv6 => Some(Ipv6Session::default()),
            },
            classification: OnceCell::new(),
        }
    }

    /// Empty IPv4 store holding at most `capacity` matches
    pub fn ipv4(capacity: usize) -> Self {
        Self::new(AddressFamily::Ipv4, capacity)
    }

    /// Empty IPv6 store holding at most `capacity` matches
    pub fn ipv6(capacity: usize) -> Self {
        Self::new(AddressFamily::Ipv6, capacity)
    }

    /// Empty store sized by the configured number of OS detection attempts
    pub fn from_config(family: AddressFamily, config: &ScanConfig) -> Self {
        Self::new(family, config.max_os_tries)
    }

    /// Append a scored match.
    ///
    /// Fails with [`FingerprintError::CapacityExceeded`] once the store is
    /// full. A perfect match is only counted as perfect while it extends an
    /// all-perfect prefix; one arriving after a non-perfect match is kept but
    /// not counted.
    pub fn add_match(&mut self, print: ScoredFingerprint) -> crate::Result<()> {
        if self.matches.len() >= self.capacity {
            return Err(FingerprintError::CapacityExceeded { capacity: self.capacity });
        }

        if self.classification.get().is_some() {
            log::warn!(
                "Match '{}' added after classification; cached summary will not include it",
                print.name()
            );
        }

        if print.is_perfect() {
            if self.num_perfect_matches == self.matches.len() {
                self.num_perfect_matches += 1;
            } else {
                log::warn!(
                    "Perfect match '{}' follows a non-perfect match; not counted as perfect",
                    print.name()
                );
            }
        }

        log::debug!(
            "Stored match {}/{}: '{}' ({:.0}%)",
            self.matches.len() + 1,
            self.capacity,
            print.name(),
            print.accuracy() * 100.0
        );
        self.matches.push(print);
        Ok(())
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn matches(&self) -> &[ScoredFingerprint] {
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

    pub fn set_overall_status(&mut self, status: OsScanStatus) {
        self.overall_status = status;
    }

    pub fn diagnostics(&self) -> &HostDiagnostics {
        &self.diagnostics
    }

    pub fn set_open_tcp_port(&mut self, port: u16) {
        self.diagnostics.open_tcp_port = Some(port);
    }

    pub fn set_closed_tcp_port(&mut self, port: u16) {
        self.diagnostics.closed_tcp_port = Some(port);
    }

    pub fn set_closed_udp_port(&mut self, port: u16) {
        self.diagnostics.closed_udp_port = Some(port);
    }

    /// Record the measured hop distance. Values below -1 are stored as given;
    /// the submission gate reports them.
    pub fn set_distance(&mut self, distance: i32, method: DistanceMethod) {
        self.diagnostics.distance = distance;
        self.diagnostics.distance_method = method;
    }

    pub fn set_distance_guess(&mut self, guess: i32) {
        self.diagnostics.distance_guess = guess;
    }

    /// Record a timing ratio observation, keeping the largest seen
    pub fn record_timing_ratio(&mut self, ratio: f64) {
        if ratio > self.diagnostics.max_timing_ratio {
            self.diagnostics.max_timing_ratio = ratio;
        }
    }

    pub fn set_max_timing_ratio(&mut self, ratio: f64) {
        self.diagnostics.max_timing_ratio = ratio;
    }

    /// Flag that some probes could not be sent
    pub fn mark_incomplete(&mut self) {
        self.diagnostics.incomplete = true;
    }

    pub fn ipv6_session(&self) -> Option<&Ipv6Session> {
        self.ipv6.as_ref()
    }

    pub fn set_flow_label(&mut self, flow_label: u32) {
        match self.ipv6.as_mut() {
            Some(session) => session.flow_label = flow_label,
            None => log::debug!("Ignoring flow label on an IPv4 result"),
        }
    }

    pub fn mark_begin(&mut self, begin_time: DateTime<Utc>) {
        match self.ipv6.as_mut() {
            Some(session) => session.begin_time = Some(begin_time),
            None => log::debug!("Ignoring probe start time on an IPv4 result"),
        }
    }

    /// Reason not to offer this fingerprint for submission, or `None` if it
    /// is good enough
    pub fn submission_rejection_reason(&self, config: &ScanConfig) -> Option<RejectionReason> {
        let reason = match self.family {
            AddressFamily::Ipv4 => gate::evaluate_general(&self.diagnostics, config),
            AddressFamily::Ipv6 => gate::evaluate_ipv6(&self.diagnostics, config),
        };

        if let Some(reason) = &reason {
            log::debug!("Fingerprint not suitable for submission: {}", reason);
        }
        reason
    }

    /// Classification summary, computed once and cached
    pub fn classification(&self) -> &ClassificationSummary {
        self.classification.get_or_init(|| {
            classify(
                &self.matches,
                self.num_perfect_matches,
                self.overall_status,
                MAX_FP_RESULTS,
            )
        })
    }

    pub fn is_classified(&self) -> bool {
        self.classification.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osscan::OsClass;

    fn print(name: &str, accuracy: f64) -> ScoredFingerprint {
        let class = OsClass::new(Some(name), Some(name), Some("general purpose"), None);
        ScoredFingerprint::new(name, accuracy, vec![class]).unwrap()
    }

    #[test]
    fn test_new_store_is_empty() {
        let results = FingerprintResults::ipv4(5);
        assert_eq!(results.num_matches(), 0);
        assert_eq!(results.num_perfect_matches(), 0);
        assert_eq!(results.overall_status(), OsScanStatus::NoMatches);
        assert_eq!(results.diagnostics().distance, DISTANCE_UNKNOWN);
        assert!(results.ipv6_session().is_none());
        assert!(!results.is_classified());
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut results = FingerprintResults::ipv4(2);
        results.add_match(print("a", 1.0)).unwrap();
        results.add_match(print("b", 0.9)).unwrap();

        let err = results.add_match(print("c", 0.8)).unwrap_err();
        assert!(matches!(err, FingerprintError::CapacityExceeded { capacity: 2 }));
        assert_eq!(results.num_matches(), 2);
    }

    #[test]
    fn test_perfect_prefix_counting() {
        let mut results = FingerprintResults::ipv4(5);
        results.add_match(print("a", 1.0)).unwrap();
        results.add_match(print("b", 1.0)).unwrap();
        results.add_match(print("c", 0.9)).unwrap();
        // Out of order perfect match is stored but not counted
        results.add_match(print("d", 1.0)).unwrap();

        assert_eq!(results.num_matches(), 4);
        assert_eq!(results.num_perfect_matches(), 2);
        assert_eq!(results.matches()[3].name(), "d");
    }

    #[test]
    fn test_timing_ratio_keeps_maximum() {
        let mut results = FingerprintResults::ipv4(5);
        results.record_timing_ratio(1.2);
        results.record_timing_ratio(0.9);
        assert_eq!(results.diagnostics().max_timing_ratio, 1.2);

        results.set_max_timing_ratio(0.5);
        assert_eq!(results.diagnostics().max_timing_ratio, 0.5);
    }

    #[test]
    fn test_diagnostic_setters() {
        let mut results = FingerprintResults::ipv4(5);
        results.set_open_tcp_port(80);
        results.set_closed_tcp_port(1);
        results.set_closed_udp_port(33434);
        results.set_distance(3, DistanceMethod::Icmp);
        results.set_distance_guess(4);
        results.mark_incomplete();

        let facts = results.diagnostics();
        assert_eq!(facts.open_tcp_port, Some(80));
        assert_eq!(facts.closed_tcp_port, Some(1));
        assert_eq!(facts.closed_udp_port, Some(33434));
        assert_eq!(facts.distance, 3);
        assert_eq!(facts.distance_method, DistanceMethod::Icmp);
        assert_eq!(facts.distance_guess, 4);
        assert!(facts.incomplete);
    }

    #[test]
    fn test_ipv6_session() {
        let mut results = FingerprintResults::ipv6(5);
        let now = Utc::now();
        results.set_flow_label(0x12345);
        results.mark_begin(now);

        let session = results.ipv6_session().unwrap();
        assert_eq!(session.flow_label, 0x12345);
        assert_eq!(session.begin_time, Some(now));

        let mut v4 = FingerprintResults::ipv4(5);
        v4.set_flow_label(7);
        assert!(v4.ipv6_session().is_none());
    }

    #[test]
    fn test_classification_is_memoized() {
        let mut results = FingerprintResults::ipv4(5);
        results.add_match(print("Linux", 1.0)).unwrap();
        results.set_overall_status(OsScanStatus::Success);

        let first = results.classification().clone();
        assert!(results.is_classified());
        assert_eq!(first.num_matches(), 1);

        results.add_match(print("OpenBSD", 1.0)).unwrap();
        assert_eq!(results.classification(), &first);
        assert_eq!(results.classification().num_matches(), 1);
    }

    #[test]
    fn test_gate_dispatches_on_family() {
        let config = ScanConfig::default();
        let mut v4 = FingerprintResults::ipv4(5);
        let mut v6 = FingerprintResults::ipv6(5);
        for results in [&mut v4, &mut v6] {
            results.set_closed_tcp_port(1);
        }

        assert_eq!(
            v4.submission_rejection_reason(&config),
            Some(RejectionReason::MissingOpenTcpPort)
        );
        assert_eq!(v6.submission_rejection_reason(&config), None);
    }

    #[test]
    fn test_from_config_uses_max_os_tries() {
        let config = ScanConfig::new().with_max_os_tries(3);
        let results = FingerprintResults::from_config(AddressFamily::Ipv6, &config);
        assert_eq!(results.capacity(), 3);
        assert_eq!(results.family(), AddressFamily::Ipv6);
    }
}
