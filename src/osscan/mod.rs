//! OS scan result aggregation
//!
//! The fingerprinting engine feeds scored candidate fingerprints into a
//! [`FingerprintResults`] store for each host. Once probing is over the store
//! answers two questions: what the host most likely runs
//! ([`FingerprintResults::classification`]) and whether the observed
//! fingerprint is good enough to offer for database submission
//! ([`FingerprintResults::submission_rejection_reason`]).

pub mod class;
pub mod classify;
pub mod gate;
pub mod results;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use class::{OsClass, ScoredFingerprint};
pub use classify::{classify, ClassificationSummary, OsClassMatch};
pub use gate::RejectionReason;
pub use results::{DistanceMethod, FingerprintResults, HostDiagnostics, Ipv6Session};

/// Maximum number of distinct classifications kept in a summary
pub const MAX_FP_RESULTS: usize = 36;

/// Distance value meaning the hop count could not be determined
pub const DISTANCE_UNKNOWN: i32 = -1;

/// Overall outcome of matching or classifying a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsScanStatus {
    Success,
    NoMatches,
    /// Results were truncated and may hide a confident answer
    TooManyMatches,
}

impl fmt::Display for OsScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsScanStatus::Success => write!(f, "success"),
            OsScanStatus::NoMatches => write!(f, "no matches"),
            OsScanStatus::TooManyMatches => write!(f, "too many matches"),
        }
    }
}

/// Address family of the scanned host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::Ipv4 => write!(f, "ipv4"),
            AddressFamily::Ipv6 => write!(f, "ipv6"),
        }
    }
}
