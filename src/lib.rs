//! fpresults - OS fingerprint result aggregation
//!
//! Turns the scored fingerprint matches gathered for a host into a
//! deduplicated OS classification and decides whether the observed
//! fingerprint is trustworthy enough to offer for database submission.

pub mod config;
pub mod error;
pub mod input;
pub mod osscan;
pub mod output;

// Re-export commonly used types
pub use config::{ScanConfig, TimingProfile};
pub use error::FingerprintError;
pub use input::HostRecord;
pub use osscan::{
    AddressFamily, ClassificationSummary, FingerprintResults, OsClass, OsScanStatus, RejectionReason,
    ScoredFingerprint,
};

pub type Result<T> = std::result::Result<T, FingerprintError>;
