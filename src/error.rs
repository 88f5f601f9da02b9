//! Error handling for fingerprint result aggregation
//!
//! Only contract violations and I/O or parse failures are errors here. A
//! truncated classification is reported through [`crate::osscan::OsScanStatus`]
//! and a poor-quality fingerprint through a
//! [`crate::osscan::gate::RejectionReason`], never through this type.

use thiserror::Error;

/// Main error type for fingerprint result operations
#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("Match capacity exceeded: at most {capacity} fingerprints may be stored per host")]
    CapacityExceeded { capacity: usize },

    #[error("Invalid accuracy {0}: must be within 0.0 and 1.0")]
    InvalidAccuracy(f64),

    #[error("Fingerprint '{0}' has no OS classification")]
    EmptyClassification(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Output error: {0}")]
    OutputError(String),
}

impl FingerprintError {
    /// True for errors caused by a caller breaking the store's contract
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, FingerprintError::CapacityExceeded { .. })
    }
}
