//! Host record input
//!
//! A host record is the fingerprinting engine's output for one host, saved
//! as JSON or TOML: the raw match status, the ordered scored matches and the
//! diagnostic facts gathered while probing. Replaying a record rebuilds the
//! [`FingerprintResults`] store exactly as the engine would have filled it.

use crate::config::ScanConfig;
use crate::osscan::{AddressFamily, FingerprintResults, HostDiagnostics, OsScanStatus, ScoredFingerprint};
use crate::FingerprintError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Supported host record formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Toml,
}

impl FileFormat {
    /// Detect the format from the file extension, defaulting to JSON
    pub fn detect<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => FileFormat::Toml,
            _ => FileFormat::Json,
        }
    }
}

/// Saved fingerprinting output for one host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostRecord {
    pub target: String,
    #[serde(default = "default_family")]
    pub family: AddressFamily,
    #[serde(default = "default_status")]
    pub status: OsScanStatus,
    #[serde(default)]
    pub diagnostics: HostDiagnostics,
    #[serde(default)]
    pub flow_label: Option<u32>,
    #[serde(default)]
    pub matches: Vec<ScoredFingerprint>,
}

fn default_family() -> AddressFamily {
    AddressFamily::Ipv4
}

fn default_status() -> OsScanStatus {
    OsScanStatus::Success
}

impl HostRecord {
    /// Parse a record from a string in the given format
    pub fn parse(content: &str, format: FileFormat) -> crate::Result<Self> {
        match format {
            FileFormat::Json => serde_json::from_str(content)
                .map_err(|e| FingerprintError::ParseError(format!("Invalid JSON host record: {}", e))),
            FileFormat::Toml => toml::from_str(content)
                .map_err(|e| FingerprintError::ParseError(format!("Invalid TOML host record: {}", e))),
        }
    }

    /// Read a record from a file, choosing the format by extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = fs::read_to_string(&path)?;
        Self::parse(&content, FileFormat::detect(&path))
    }

    /// Replay the record into a fresh result store sized by `config`
    pub fn into_results(self, config: &ScanConfig) -> crate::Result<FingerprintResults> {
        let mut results = FingerprintResults::from_config(self.family, config);
        log::debug!(
            "Replaying {} matches for {} ({})",
            self.matches.len(),
            self.target,
            self.family
        );

        for print in self.matches {
            results.add_match(print)?;
        }
        results.set_overall_status(self.status);

        let facts = self.diagnostics;
        if let Some(port) = facts.open_tcp_port {
            results.set_open_tcp_port(port);
        }
        if let Some(port) = facts.closed_tcp_port {
            results.set_closed_tcp_port(port);
        }
        if let Some(port) = facts.closed_udp_port {
            results.set_closed_udp_port(port);
        }
        results.set_distance(facts.distance, facts.distance_method);
        results.set_distance_guess(facts.distance_guess);
        results.set_max_timing_ratio(facts.max_timing_ratio);
        if facts.incomplete {
            results.mark_incomplete();
        }
        if let Some(flow_label) = self.flow_label {
            results.set_flow_label(flow_label);
        }

        Ok(results)
    }
}
