//! OS classification labels and scored reference fingerprints

use crate::FingerprintError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification attached to a reference fingerprint
///
/// Two classes are equal when each of the four fields is either absent on
/// both sides or present and byte-identical on both sides. There is no fuzzy
/// matching: classes differing only in generation are distinct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct OsClass {
    pub vendor: Option<String>,
    pub family: Option<String>,
    pub device_type: Option<String>,
    pub generation: Option<String>,
}

impl OsClass {
    pub fn new(
        vendor: Option<&str>,
        family: Option<&str>,
        device_type: Option<&str>,
        generation: Option<&str>,
    ) -> Self {
        Self {
            vendor: vendor.map(str::to_string),
            family: family.map(str::to_string),
            device_type: device_type.map(str::to_string),
            generation: generation.map(str::to_string),
        }
    }

    /// "Vendor Family Generation", skipping absent parts and a family that
    /// repeats the vendor name (e.g. "Linux Linux 2.6.X" becomes "Linux 2.6.X")
    pub fn describe(&self) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(3);
        if let Some(vendor) = self.vendor.as_deref() {
            parts.push(vendor);
        }
        if let Some(family) = self.family.as_deref() {
            if self.vendor.as_deref() != Some(family) {
                parts.push(family);
            }
        }
        if let Some(generation) = self.generation.as_deref() {
            parts.push(generation);
        }

        if parts.is_empty() {
            "unknown".to_string()
        } else {
            parts.join(" ")
        }
    }
}

impl fmt::Display for OsClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.device_type.as_deref() {
            Some(device_type) => write!(f, "{} ({})", self.describe(), device_type),
            None => write!(f, "{}", self.describe()),
        }
    }
}

/// A reference fingerprint matched against the host, with its accuracy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScoredFingerprint")]
pub struct ScoredFingerprint {
    name: String,
    accuracy: f64,
    classes: Vec<OsClass>,
}

#[derive(Deserialize)]
struct RawScoredFingerprint {
    name: String,
    accuracy: f64,
    classes: Vec<OsClass>,
}

impl TryFrom<RawScoredFingerprint> for ScoredFingerprint {
    type Error = FingerprintError;

    fn try_from(raw: RawScoredFingerprint) -> Result<Self, Self::Error> {
        ScoredFingerprint::new(raw.name, raw.accuracy, raw.classes)
    }
}

impl ScoredFingerprint {
    /// Build a scored fingerprint; accuracy must lie in `0.0..=1.0` and at
    /// least one classification is required
    pub fn new(name: impl Into<String>, accuracy: f64, classes: Vec<OsClass>) -> crate::Result<Self> {
        let name = name.into();
        if !(0.0..=1.0).contains(&accuracy) {
            return Err(FingerprintError::InvalidAccuracy(accuracy));
        }
        if classes.is_empty() {
            return Err(FingerprintError::EmptyClassification(name));
        }

        Ok(Self { name, accuracy, classes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    pub fn classes(&self) -> &[OsClass] {
        &self.classes
    }

    /// A perfect match has an accuracy of exactly 1.0
    pub fn is_perfect(&self) -> bool {
        self.accuracy == 1.0
    }
}
