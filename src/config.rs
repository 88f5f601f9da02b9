//! Configuration module for fingerprint result evaluation
//!
//! The submission gate never reads process-wide state; every scan-level fact
//! it needs travels in a [`ScanConfig`] passed by the caller.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Scan-level settings that influence how fingerprint results are judged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Delay between probes in milliseconds
    pub scan_delay_ms: u64,

    /// Timing template (0-5)
    pub timing_template: u8,

    /// Whether a UDP port scan was requested alongside OS detection
    pub udp_scan: bool,

    /// Maximum OS detection attempts per host, which bounds stored matches
    pub max_os_tries: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scan_delay_ms: 0,
            timing_template: 3, // Default timing template
            udp_scan: false,
            max_os_tries: 5,
        }
    }
}

impl ScanConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scan delay in milliseconds
    pub fn with_scan_delay(mut self, scan_delay_ms: u64) -> Self {
        self.scan_delay_ms = scan_delay_ms;
        self
    }

    /// Set the timing template
    pub fn with_timing_template(mut self, timing_template: u8) -> Self {
        self.timing_template = timing_template;
        self
    }

    /// Record whether a UDP scan was requested
    pub fn with_udp_scan(mut self, udp_scan: bool) -> Self {
        self.udp_scan = udp_scan;
        self
    }

    /// Set the maximum number of OS detection attempts
    pub fn with_max_os_tries(mut self, max_os_tries: usize) -> Self {
        self.max_os_tries = max_os_tries;
        self
    }

    /// Timing profile matching the configured template
    pub fn timing_profile(&self) -> Option<TimingProfile> {
        TimingProfile::from_level(self.timing_template)
    }

    /// Load configuration from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| crate::FingerprintError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: ScanConfig = toml::from_str(&content)
            .map_err(|e| crate::FingerprintError::ConfigError(format!("Failed to parse TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load_default_config() -> Self {
        // Try to load from ~/.fpresults.toml
        let home_dir = dirs::home_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        let config_path = home_dir.join(".fpresults.toml");

        if config_path.exists() {
            match Self::from_toml_file(&config_path) {
                Ok(config) => {
                    log::debug!("Loaded config from {}", config_path.display());
                    return config;
                }
                Err(e) => log::warn!("Ignoring {}: {}", config_path.display(), e),
            }
        }

        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if TimingProfile::from_level(self.timing_template).is_none() {
            return Err(crate::FingerprintError::ConfigError(format!(
                "Timing template must be between 0 and 5, got {}",
                self.timing_template
            )));
        }

        if self.max_os_tries == 0 {
            return Err(crate::FingerprintError::ConfigError(
                "max_os_tries must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Timing profile for different scan types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingProfile {
    Paranoid,   // Very slow and stealthy
    Sneaky,     // Slow and stealthy
    Polite,     // Normal speed
    Normal,     // Default timing
    Aggressive, // Fast scanning
    Insane,     // Very fast scanning
}

impl TimingProfile {
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(TimingProfile::Paranoid),
            1 => Some(TimingProfile::Sneaky),
            2 => Some(TimingProfile::Polite),
            3 => Some(TimingProfile::Normal),
            4 => Some(TimingProfile::Aggressive),
            5 => Some(TimingProfile::Insane),
            _ => None,
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            TimingProfile::Paranoid => 0,
            TimingProfile::Sneaky => 1,
            TimingProfile::Polite => 2,
            TimingProfile::Normal => 3,
            TimingProfile::Aggressive => 4,
            TimingProfile::Insane => 5,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TimingProfile::Paranoid => "Paranoid",
            TimingProfile::Sneaky => "Sneaky",
            TimingProfile::Polite => "Polite",
            TimingProfile::Normal => "Normal",
            TimingProfile::Aggressive => "Aggressive",
            TimingProfile::Insane => "Insane",
        }
    }
}

impl fmt::Display for TimingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
