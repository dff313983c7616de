//! Extracting a coverage percentage from coverage tool output.

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{BadgeError, Result};

/// Descriptor printed by kover's log task in front of `coverage: NN.N%`.
pub const DEFAULT_DESCRIPTOR: &str = "application line";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Free-form log text with a `<descriptor> coverage: <number>%` line.
    #[default]
    Log,
    /// An lcov tracefile; the percentage is computed from `LF:`/`LH:` records.
    Lcov,
}

impl FromStr for ReportFormat {
    type Err = BadgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" | "kover" | "text" => Ok(ReportFormat::Log),
            "lcov" | "info" => Ok(ReportFormat::Lcov),
            other => Err(BadgeError::Config(format!("unknown report format: {other}"))),
        }
    }
}

/// Finds the first `<descriptor> coverage: <number>%` occurrence in report text.
#[derive(Debug, Clone)]
pub struct CoverageParser {
    pattern: Regex,
}

impl CoverageParser {
    /// Build a parser for lines starting with `descriptor`, matched
    /// case-insensitively and with any run of whitespace between words.
    pub fn new(descriptor: &str) -> Result<Self> {
        let words: Vec<String> = descriptor.split_whitespace().map(regex::escape).collect();
        let label = if words.is_empty() {
            String::new()
        } else {
            format!(r"{}\s+", words.join(r"\s+"))
        };
        let pattern = Regex::new(&format!(
            r"(?i){label}coverage\s*:\s*(?P<percentage>\d+(?:\.\d+)?)\s*%"
        ))
        .map_err(|e| BadgeError::Config(format!("invalid coverage descriptor: {e}")))?;
        Ok(Self { pattern })
    }

    pub fn parse_percentage(&self, report: &str) -> Result<f64> {
        report
            .lines()
            .find_map(|line| self.pattern.captures(line))
            .and_then(|caps| caps.name("percentage")?.as_str().parse::<f64>().ok())
            .ok_or(BadgeError::CoverageNotFound)
    }
}

static DEFAULT_PARSER: Lazy<CoverageParser> =
    Lazy::new(|| CoverageParser::new(DEFAULT_DESCRIPTOR).unwrap());

impl Default for CoverageParser {
    fn default() -> Self {
        DEFAULT_PARSER.clone()
    }
}

/// Parse a kover-style log with the default descriptor.
pub fn parse_percentage(report: &str) -> Result<f64> {
    DEFAULT_PARSER.parse_percentage(report)
}

/// Line coverage of an lcov tracefile, rounded to one decimal.
///
/// A tracefile without any instrumented lines has no meaningful coverage and
/// is reported as [`BadgeError::CoverageNotFound`].
pub fn lcov_percentage(tracefile: &str) -> Result<f64> {
    let mut found: u64 = 0;
    let mut hit: u64 = 0;
    for line in tracefile.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("LF:") {
            if let Ok(v) = rest.trim().parse::<u64>() {
                found = found.saturating_add(v);
            }
        } else if let Some(rest) = line.strip_prefix("LH:")
            && let Ok(v) = rest.trim().parse::<u64>()
        {
            hit = hit.saturating_add(v);
        }
    }
    if found == 0 {
        return Err(BadgeError::CoverageNotFound);
    }
    let percent = (hit as f64) * 100.0 / (found as f64);
    Ok((percent * 10.0).round() / 10.0)
}

/// Extract the percentage from `report` according to `format`.
pub fn extract_percentage(report: &str, format: ReportFormat, descriptor: &str) -> Result<f64> {
    match format {
        ReportFormat::Log if descriptor == DEFAULT_DESCRIPTOR => parse_percentage(report),
        ReportFormat::Log => CoverageParser::new(descriptor)?.parse_percentage(report),
        ReportFormat::Lcov => lcov_percentage(report),
    }
}
