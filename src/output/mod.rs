//! Output formatting for OS classification and submission verdicts

use crate::config::ScanConfig;
use crate::osscan::{ClassificationSummary, FingerprintResults, OsScanStatus};
use colored::*;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Cursor, Write};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    NmapXml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "xml" | "nmapxml" | "nmap-xml" => Ok(OutputFormat::NmapXml),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub file: Option<String>,
    pub colored: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            file: None,
            colored: true,
        }
    }
}

#[derive(Serialize)]
struct JsonOsReport<'a> {
    target: &'a str,
    family: String,
    raw_status: OsScanStatus,
    matches_considered: usize,
    classification: &'a ClassificationSummary,
    submission_ok: bool,
    rejection_reason: Option<String>,
}

/// Main output manager
pub struct OutputManager {
    config: OutputConfig,
}

impl OutputManager {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Render and write the report for one host
    pub fn write_report(&self, target: &str, results: &FingerprintResults, scan: &ScanConfig) -> io::Result<()> {
        let output = self.render(target, results, scan)?;

        match &self.config.file {
            Some(filename) => {
                let mut file = File::create(filename)?;
                file.write_all(output.as_bytes())?;
                log::debug!("Wrote report for {} to {}", target, filename);
            }
            None => {
                print!("{}", output);
            }
        }

        Ok(())
    }

    /// Render the report for one host in the configured format
    pub fn render(&self, target: &str, results: &FingerprintResults, scan: &ScanConfig) -> io::Result<String> {
        match self.config.format {
            OutputFormat::Text => Ok(self.format_text(target, results, scan)),
            OutputFormat::Json => self.format_json(target, results, scan),
            OutputFormat::NmapXml => self.format_nmap_xml(target, results),
        }
    }

    fn format_text(&self, target: &str, results: &FingerprintResults, scan: &ScanConfig) -> String {
        let summary = results.classification();
        let mut output = String::new();

        output.push_str(&format!("OS detection results for {}\n", target));

        match summary.overall_status() {
            OsScanStatus::TooManyMatches => {
                output.push_str(&self.colorize(
                    "Too many fingerprints match this host to give specific OS details\n",
                    "yellow",
                ));
            }
            OsScanStatus::NoMatches => {
                output.push_str(&self.colorize("No OS matches for host\n", "red"));
            }
            OsScanStatus::Success => {
                let device_types = summary.device_types();
                if !device_types.is_empty() {
                    output.push_str(&format!("Device type: {}\n", device_types.join("|")));
                }

                let label = if summary.num_perfect_matches() > 0 {
                    "OS classification"
                } else {
                    "Aggressive OS guesses"
                };
                let guesses: Vec<String> = summary
                    .matches()
                    .iter()
                    .map(|m| format!("{} ({:.0}%)", m.class.describe(), m.accuracy * 100.0))
                    .collect();
                output.push_str(&self.colorize(&format!("{}: {}\n", label, guesses.join(", ")), "green"));
            }
        }

        match results.submission_rejection_reason(scan) {
            None => output.push_str("OS fingerprint is suitable for submission\n"),
            Some(reason) => output.push_str(&self.colorize(
                &format!("OS fingerprint not offered for submission: {}\n", reason),
                "gray",
            )),
        }

        output
    }

    fn format_json(&self, target: &str, results: &FingerprintResults, scan: &ScanConfig) -> io::Result<String> {
        let reason = results.submission_rejection_reason(scan);
        let report = JsonOsReport {
            target,
            family: results.family().to_string(),
            raw_status: results.overall_status(),
            matches_considered: results.num_matches(),
            classification: results.classification(),
            submission_ok: reason.is_none(),
            rejection_reason: reason.map(|r| r.to_string()),
        };

        let mut json = serde_json::to_string_pretty(&report)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        json.push('\n');
        Ok(json)
    }

    fn format_nmap_xml(&self, target: &str, results: &FingerprintResults) -> io::Result<String> {
        let mut buffer = Vec::new();
        let mut writer = Writer::new_with_indent(Cursor::new(&mut buffer), b' ', 2);
        let summary = results.classification();

        let mut host = BytesStart::new("host");
        host.push_attribute(("addr", target));
        host.push_attribute(("addrtype", results.family().to_string().as_str()));
        writer.write_event(Event::Start(host)).map_err(xml_err)?;

        writer.write_event(Event::Start(BytesStart::new("os"))).map_err(xml_err)?;

        for m in summary.matches() {
            let mut osclass = BytesStart::new("osclass");
            if let Some(device_type) = m.class.device_type.as_deref() {
                osclass.push_attribute(("type", device_type));
            }
            if let Some(vendor) = m.class.vendor.as_deref() {
                osclass.push_attribute(("vendor", vendor));
            }
            if let Some(family) = m.class.family.as_deref() {
                osclass.push_attribute(("osfamily", family));
            }
            if let Some(generation) = m.class.generation.as_deref() {
                osclass.push_attribute(("osgen", generation));
            }
            let accuracy = format!("{:.0}", m.accuracy * 100.0);
            osclass.push_attribute(("accuracy", accuracy.as_str()));
            writer.write_event(Event::Empty(osclass)).map_err(xml_err)?;
        }

        writer.write_event(Event::End(BytesEnd::new("os"))).map_err(xml_err)?;
        writer.write_event(Event::End(BytesEnd::new("host"))).map_err(xml_err)?;

        let mut xml = String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        xml.push('\n');
        Ok(xml)
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.config.colored {
            return text.to_string();
        }

        match color {
            "green" => text.bright_green().to_string(),
            "yellow" => text.bright_yellow().to_string(),
            "red" => text.bright_red().to_string(),
            "gray" => text.bright_black().to_string(),
            _ => text.to_string(),
        }
    }
}

fn xml_err<E>(e: E) -> io::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    io::Error::new(io::ErrorKind::Other, e)
}
