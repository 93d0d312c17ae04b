// SPDX-License-Identifier: Apache-2.0

//! OpenSSL `speed` invocation and report parsing.
//!
//! `openssl speed -kem-algorithms` prints an aggregate per algorithm and
//! phase rather than per-trial samples, so each recognized data point is
//! reconciled into the common record schema as a single synthetic trial
//! with index 0. The report text is free-form; only lines of the fixed
//! grammar below are extracted and everything else is ignored:
//!
//! ```text
//! Doing <alg> <phase> ops for <n>s: <count> <words> in <secs>s
//! ```

use std::collections::HashMap;
use std::fmt;
use std::process::Command;

use chrono::Utc;
use regex::RegexBuilder;

use crate::error::{StoreError, ToolError};
use crate::record::TrialRecord;
use crate::session::EnergyReadings;
use crate::store::ResultStore;

const OPENSSL_SPEED: &str = "openssl speed";

/// KEM phase as named in the speed report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Keygen,
    Encaps,
    Decaps,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Keygen, Phase::Encaps, Phase::Decaps];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Keygen => "keygen",
            Phase::Encaps => "encaps",
            Phase::Decaps => "decaps",
        }
    }

    fn from_report(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "keygen" => Some(Phase::Keygen),
            "encaps" => Some(Phase::Encaps),
            "decaps" => Some(Phase::Decaps),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Invoke `openssl speed -seconds <n> -kem-algorithms` and return its
/// stdout. The tool's own `-seconds` bound guarantees forward progress.
///
/// # Errors
/// Returns ToolError if the process cannot be spawned, exits non-zero, or
/// prints nothing at all. A report without matching lines is not an error.
pub fn run_openssl_speed(seconds: u32) -> Result<String, ToolError> {
    let output = Command::new("openssl")
        .args(["speed", "-seconds", &seconds.to_string(), "-kem-algorithms"])
        .output()
        .map_err(|e| ToolError::Spawn {
            command: OPENSSL_SPEED.to_string(),
            source: e,
        })?;

    if !output.status.success() {
        return Err(ToolError::NonZeroExit {
            command: OPENSSL_SPEED.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if stdout.trim().is_empty() {
        return Err(ToolError::EmptyOutput {
            command: OPENSSL_SPEED.to_string(),
        });
    }
    Ok(stdout)
}

/// Best-effort parser for the speed report's fixed-grammar lines.
pub struct SpeedReportParser {
    line_re: regex::Regex,
}

impl SpeedReportParser {
    pub fn new() -> Self {
        let line_re = RegexBuilder::new(
            r"Doing\s+(?P<alg>\S+)\s+(?P<phase>keygen|encaps|decaps)\s+ops\s+for\s+\d+s:\s+(?P<count>\d+)\s+.+?\s+in\s+(?P<seconds>\d+(\.\d+)?)s",
        )
        .case_insensitive(true)
        .build()
        .expect("speed report grammar is a valid regex");
        Self { line_re }
    }

    /// Extract `(alg, phase) -> ms_per_op` from the report text.
    ///
    /// Non-matching lines are skipped; the report contains many unrelated
    /// sections. If the same pair appears on multiple lines, the last
    /// occurrence wins (later report sections are overridden runs).
    pub fn parse(&self, text: &str) -> HashMap<(String, Phase), f64> {
        let mut results = HashMap::new();
        for line in text.lines() {
            let Some(caps) = self.line_re.captures(line) else {
                continue;
            };
            let Some(phase) = Phase::from_report(&caps["phase"]) else {
                continue;
            };
            let Ok(count) = caps["count"].parse::<u64>() else {
                continue;
            };
            let Ok(seconds) = caps["seconds"].parse::<f64>() else {
                continue;
            };
            if count == 0 {
                continue;
            }
            let ms_per_op = (seconds * 1000.0) / count as f64;
            results.insert((caps["alg"].to_string(), phase), ms_per_op);
        }
        results
    }
}

impl Default for SpeedReportParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Synthesize one trial-0 record per parsed (alg, phase) whose algorithm is
/// on the allow-list, and append them to the store. Returns the number of
/// records appended; zero means the requested algorithms simply were not
/// benchmarked in this report.
pub fn import_report(
    store: &ResultStore,
    report: &str,
    allowed_algs: &[String],
    source_tag: &str,
) -> Result<usize, StoreError> {
    let parsed = SpeedReportParser::new().parse(report);
    let timestamp = Utc::now().timestamp_micros() as f64 / 1_000_000.0;

    let mut imported = 0;
    for alg in allowed_algs {
        for phase in Phase::ALL {
            let key = (alg.clone(), phase);
            let Some(&ms_per_op) = parsed.get(&key) else {
                continue;
            };
            let configuration = format!("{source_tag}_{alg}_{phase}");
            store.append(&TrialRecord::new(
                timestamp,
                configuration,
                0,
                ms_per_op,
                EnergyReadings::default(),
            ))?;
            imported += 1;
        }
    }

    if imported == 0 {
        tracing::info!(
            algorithms = ?allowed_algs,
            "Report contained no matching benchmark lines"
        );
    } else {
        tracing::info!(imported, source_tag, "Imported external benchmark rows");
    }
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_literal_line() {
        let parser = SpeedReportParser::new();
        let map = parser.parse("Doing x25519 keygen ops for 3s: 450000 keygen in 3.00s");

        let ms = map[&("x25519".to_string(), Phase::Keygen)];
        assert!((ms - 0.006_667).abs() < 1e-5);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_parse_ignores_unrelated_lines() {
        let parser = SpeedReportParser::new();
        let map = parser.parse("unrelated benchmark noise\nversion: OpenSSL 3.5.0\n");
        assert!(map.is_empty());
    }

    #[test]
    fn test_parse_is_case_insensitive_on_phase() {
        let parser = SpeedReportParser::new();
        let map = parser.parse("Doing ML-KEM-768 Encaps ops for 3s: 120000 ops in 3.00s");
        assert!(map.contains_key(&("ML-KEM-768".to_string(), Phase::Encaps)));
    }

    #[test]
    fn test_duplicate_pair_last_occurrence_wins() {
        let parser = SpeedReportParser::new();
        let text = "\
Doing ML-KEM-512 encaps ops for 3s: 100000 encaps in 3.00s
some interleaved section
Doing ML-KEM-512 encaps ops for 3s: 200000 encaps in 3.00s
";
        let map = parser.parse(text);
        let ms = map[&("ML-KEM-512".to_string(), Phase::Encaps)];
        assert!((ms - 0.015).abs() < 1e-9);
    }

    #[test]
    fn test_import_filters_by_allow_list() {
        let dir = TempDir::new().unwrap();
        let store = ResultStore::new(dir.path().join("results.csv"));

        let report = "\
Doing X25519 keygen ops for 3s: 450000 keygen in 3.00s
Doing ML-KEM-768 keygen ops for 3s: 300000 keygen in 3.00s
Doing ML-KEM-768 encaps ops for 3s: 240000 encaps in 3.00s
Doing frodo976 keygen ops for 3s: 9000 keygen in 3.00s
";
        let imported = import_report(
            &store,
            report,
            &["ML-KEM-768".to_string()],
            "openssl",
        )
        .unwrap();
        assert_eq!(imported, 2);

        let records = store.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].configuration, "openssl_ML-KEM-768_keygen");
        assert_eq!(records[1].configuration, "openssl_ML-KEM-768_encaps");
        for record in &records {
            assert_eq!(record.trial, 0);
            assert!(record.energy_j.is_none());
        }
    }

    #[test]
    fn test_import_with_no_matches_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let store = ResultStore::new(dir.path().join("results.csv"));

        let imported = import_report(
            &store,
            "unrelated benchmark noise",
            &["ML-KEM-768".to_string()],
            "openssl",
        )
        .unwrap();
        assert_eq!(imported, 0);
    }
}
