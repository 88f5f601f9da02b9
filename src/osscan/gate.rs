//! Submission gate for observed fingerprints
//!
//! A fingerprint of doubtful quality should not be offered for inclusion in
//! the reference database. The checks run in a fixed order and the first one
//! that fails decides the reason; later checks are not evaluated.

use super::{HostDiagnostics, DISTANCE_UNKNOWN};
use crate::config::{ScanConfig, TimingProfile};
use std::fmt;

/// Largest scan delay that keeps sequence timing usable
pub const MAX_SCAN_DELAY_MS: u64 = 500;

/// Most aggressive timing template still accepted
pub const MAX_TIMING_LEVEL: u8 = 4;

/// Farthest host, in hops, whose fingerprint is trusted
pub const MAX_DISTANCE: i32 = 5;

/// Largest tolerated timing ratio anomaly
pub const MAX_TIMING_RATIO: f64 = 1.4;

/// Why a fingerprint should not be offered for submission
#[derive(Debug, Clone, PartialEq)]
pub enum RejectionReason {
    ScanDelayTooLarge { scan_delay_ms: u64 },
    TimingTooAggressive { timing_level: u8 },
    MissingOpenTcpPort,
    MissingClosedTcpPort,
    /// Only raised for IPv6, which needs just one of the two port kinds
    MissingTcpPort,
    NegativeDistance { distance: i32 },
    DistanceTooFar { distance: i32 },
    TimingRatioTooHigh { ratio: f64 },
    MissingUdpResponse,
    IncompleteProbes,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::ScanDelayTooLarge { scan_delay_ms } => {
                write!(f, "Scan delay ({}) is greater than {}", scan_delay_ms, MAX_SCAN_DELAY_MS)
            }
            RejectionReason::TimingTooAggressive { timing_level } => match TimingProfile::from_level(*timing_level) {
                Some(profile) => write!(f, "Timing level {} ({}) used", timing_level, profile),
                None => write!(f, "Timing level {} used", timing_level),
            },
            RejectionReason::MissingOpenTcpPort => {
                write!(f, "Missing an open TCP port so results incomplete")
            }
            RejectionReason::MissingClosedTcpPort => {
                write!(f, "Missing a closed TCP port so results incomplete")
            }
            RejectionReason::MissingTcpPort => {
                write!(f, "Missing a closed or open TCP port so results incomplete")
            }
            RejectionReason::NegativeDistance { distance } => {
                write!(f, "Host distance ({} network hops) appears to be negative", distance)
            }
            RejectionReason::DistanceTooFar { distance } => {
                write!(f, "Host distance ({} network hops) is greater than five", distance)
            }
            RejectionReason::TimingRatioTooHigh { ratio } => {
                write!(f, "maxTimingRatio ({:e}) is greater than {}", ratio, MAX_TIMING_RATIO)
            }
            RejectionReason::MissingUdpResponse => {
                write!(f, "Didn't receive UDP response. Please try again with -sSU")
            }
            RejectionReason::IncompleteProbes => {
                write!(f, "Some probes failed to send so results incomplete")
            }
        }
    }
}

fn usable_port(port: Option<u16>) -> bool {
    matches!(port, Some(p) if p > 0)
}

/// Full gate used for IPv4 style fingerprints
pub fn evaluate_general(facts: &HostDiagnostics, config: &ScanConfig) -> Option<RejectionReason> {
    // Long delays distort the sequence timing tests
    if config.scan_delay_ms > MAX_SCAN_DELAY_MS {
        return Some(RejectionReason::ScanDelayTooLarge { scan_delay_ms: config.scan_delay_ms });
    }

    if config.timing_template > MAX_TIMING_LEVEL {
        return Some(RejectionReason::TimingTooAggressive { timing_level: config.timing_template });
    }

    if !usable_port(facts.open_tcp_port) {
        return Some(RejectionReason::MissingOpenTcpPort);
    }

    if !usable_port(facts.closed_tcp_port) {
        return Some(RejectionReason::MissingClosedTcpPort);
    }

    // -1 means unknown. Anything lower comes from a UDP response whose TTL
    // exceeded the probe's own.
    if facts.distance < DISTANCE_UNKNOWN {
        return Some(RejectionReason::NegativeDistance { distance: facts.distance });
    }

    if facts.distance > MAX_DISTANCE {
        return Some(RejectionReason::DistanceTooFar { distance: facts.distance });
    }

    if facts.max_timing_ratio > MAX_TIMING_RATIO {
        return Some(RejectionReason::TimingRatioTooHigh { ratio: facts.max_timing_ratio });
    }

    // A missing U1 response only means something if we actually looked for a
    // closed UDP port
    if facts.closed_udp_port.is_none() && !config.udp_scan {
        return Some(RejectionReason::MissingUdpResponse);
    }

    if facts.incomplete {
        return Some(RejectionReason::IncompleteProbes);
    }

    None
}

/// Reduced gate for IPv6, whose classification tolerates partial data
pub fn evaluate_ipv6(facts: &HostDiagnostics, config: &ScanConfig) -> Option<RejectionReason> {
    if config.scan_delay_ms > MAX_SCAN_DELAY_MS {
        return Some(RejectionReason::ScanDelayTooLarge { scan_delay_ms: config.scan_delay_ms });
    }

    if !usable_port(facts.open_tcp_port) && !usable_port(facts.closed_tcp_port) {
        return Some(RejectionReason::MissingTcpPort);
    }

    if facts.incomplete {
        return Some(RejectionReason::IncompleteProbes);
    }

    None
}
