// SPDX-License-Identifier: Apache-2.0

//! Aggregation of trial records into per-configuration summaries.
//!
//! Summaries are always recomputed from the full record set; the exported
//! table is a cache, never the source of truth. Standard deviation is the
//! sample standard deviation (n-1 denominator), so a single-record
//! configuration reports null, not zero.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::provider::X25519Exchange;
use crate::record::TrialRecord;

/// One row of the aggregated summary. Optional fields stay in the schema
/// at all times; whether the energy columns appear in an exported table is
/// decided only at the serialization boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationSummary {
    pub configuration: String,
    pub trials: usize,
    pub mean_time_ms: f64,
    pub std_time_ms: Option<f64>,
    pub min_time_ms: f64,
    pub max_time_ms: f64,
    pub mean_energy_j: Option<f64>,
    pub std_energy_j: Option<f64>,
    pub mean_avg_current_ma: Option<f64>,
    pub mean_peak_current_ma: Option<f64>,
    pub time_overhead_vs_classical_pct: Option<f64>,
    pub energy_overhead_vs_classical_pct: Option<f64>,
}

/// Computes descriptive statistics and baseline-relative overhead per
/// configuration.
pub struct Aggregator {
    baseline: String,
}

impl Aggregator {
    /// Default baseline: the software classical-exchange configuration.
    pub const DEFAULT_BASELINE: &'static str = X25519Exchange::CONFIGURATION;

    pub fn new(baseline: impl Into<String>) -> Self {
        Self {
            baseline: baseline.into(),
        }
    }

    pub fn baseline(&self) -> &str {
        &self.baseline
    }

    /// Summarize the full record set.
    ///
    /// Rows are ordered baseline first (when present), then ascending by
    /// mean time; ties keep first-seen configuration order. If the
    /// baseline is absent, or its mean time is zero, overhead columns are
    /// null for every row rather than a computed garbage value.
    pub fn summarize(&self, records: &[TrialRecord]) -> Vec<ConfigurationSummary> {
        // Group by configuration, preserving discovery order.
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<&TrialRecord>> = HashMap::new();
        for record in records {
            if !groups.contains_key(&record.configuration) {
                order.push(record.configuration.clone());
            }
            groups
                .entry(record.configuration.clone())
                .or_default()
                .push(record);
        }

        // Energy columns exist only if any record anywhere carries energy.
        let any_energy = records.iter().any(|r| r.energy_j.is_some());

        let mut rows: Vec<ConfigurationSummary> = order
            .iter()
            .map(|configuration| {
                let group = &groups[configuration];
                let times: Vec<f64> = group.iter().map(|r| r.execution_time_ms).collect();

                let (mean_energy_j, std_energy_j, mean_avg_current_ma, mean_peak_current_ma) =
                    if any_energy {
                        let energy: Vec<f64> =
                            group.iter().filter_map(|r| r.energy_j).collect();
                        let avg_ma: Vec<f64> =
                            group.iter().filter_map(|r| r.avg_current_ma).collect();
                        let peak_ma: Vec<f64> =
                            group.iter().filter_map(|r| r.peak_current_ma).collect();
                        (
                            mean(&energy),
                            sample_std(&energy),
                            mean(&avg_ma),
                            mean(&peak_ma),
                        )
                    } else {
                        (None, None, None, None)
                    };

                ConfigurationSummary {
                    configuration: configuration.clone(),
                    trials: times.len(),
                    mean_time_ms: mean(&times).unwrap_or(0.0),
                    std_time_ms: sample_std(&times),
                    min_time_ms: times.iter().copied().fold(f64::INFINITY, f64::min),
                    max_time_ms: times.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                    mean_energy_j,
                    std_energy_j,
                    mean_avg_current_ma,
                    mean_peak_current_ma,
                    time_overhead_vs_classical_pct: None,
                    energy_overhead_vs_classical_pct: None,
                }
            })
            .collect();

        self.apply_overheads(&mut rows);

        rows.sort_by(|a, b| {
            let a_base = a.configuration == self.baseline;
            let b_base = b.configuration == self.baseline;
            b_base
                .cmp(&a_base)
                .then(a.mean_time_ms.total_cmp(&b.mean_time_ms))
        });

        rows
    }

    fn apply_overheads(&self, rows: &mut [ConfigurationSummary]) {
        let baseline_rows: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.configuration == self.baseline)
            .map(|(i, _)| i)
            .collect();

        // Absent or ambiguous baseline: every overhead stays null.
        let &[baseline_idx] = baseline_rows.as_slice() else {
            tracing::warn!(
                baseline = %self.baseline,
                candidates = baseline_rows.len(),
                "Baseline configuration unresolved; overhead columns left null"
            );
            return;
        };

        let baseline_time = rows[baseline_idx].mean_time_ms;
        if baseline_time != 0.0 {
            for row in rows.iter_mut() {
                row.time_overhead_vs_classical_pct =
                    Some((row.mean_time_ms - baseline_time) / baseline_time * 100.0);
            }
        }

        if let Some(baseline_energy) = rows[baseline_idx].mean_energy_j {
            if baseline_energy != 0.0 {
                for row in rows.iter_mut() {
                    row.energy_overhead_vs_classical_pct = row
                        .mean_energy_j
                        .map(|e| (e - baseline_energy) / baseline_energy * 100.0);
                }
            }
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASELINE)
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n-1 denominator). None for fewer than two
/// samples: a single observation carries no variance estimate.
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// True if any summary row carries energy aggregates.
fn has_energy_columns(rows: &[ConfigurationSummary]) -> bool {
    rows.iter().any(|r| r.mean_energy_j.is_some())
}

/// Write the summary table as CSV. Energy columns are emitted only when at
/// least one row has energy data.
pub fn write_summary_csv(
    path: impl AsRef<Path>,
    rows: &[ConfigurationSummary],
) -> Result<(), StoreError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
            context: "creating summary directory",
            source: e,
        })?;
    }

    let with_energy = has_energy_columns(rows);
    let mut writer = csv::Writer::from_path(path).map_err(StoreError::Csv)?;

    let mut header = vec![
        "configuration",
        "trials",
        "mean_time_ms",
        "std_time_ms",
        "min_time_ms",
        "max_time_ms",
    ];
    if with_energy {
        header.extend([
            "mean_energy_J",
            "std_energy_J",
            "mean_avg_current_mA",
            "mean_peak_current_mA",
        ]);
    }
    header.push("time_overhead_vs_classical_pct");
    if with_energy {
        header.push("energy_overhead_vs_classical_pct");
    }
    writer.write_record(&header)?;

    for row in rows {
        let mut fields = vec![
            row.configuration.clone(),
            row.trials.to_string(),
            fmt_f64(Some(row.mean_time_ms)),
            fmt_f64(row.std_time_ms),
            fmt_f64(Some(row.min_time_ms)),
            fmt_f64(Some(row.max_time_ms)),
        ];
        if with_energy {
            fields.push(fmt_f64(row.mean_energy_j));
            fields.push(fmt_f64(row.std_energy_j));
            fields.push(fmt_f64(row.mean_avg_current_ma));
            fields.push(fmt_f64(row.mean_peak_current_ma));
        }
        fields.push(fmt_f64(row.time_overhead_vs_classical_pct));
        if with_energy {
            fields.push(fmt_f64(row.energy_overhead_vs_classical_pct));
        }
        writer.write_record(&fields)?;
    }

    writer.flush().map_err(|e| StoreError::Io {
        context: "flushing summary file",
        source: e,
    })?;
    Ok(())
}

fn fmt_f64(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v}"),
        None => String::new(),
    }
}

/// Render the summary as an aligned text table for terminal output.
pub fn render_table(rows: &[ConfigurationSummary]) -> String {
    let mut out = String::new();
    let name_width = rows
        .iter()
        .map(|r| r.configuration.len())
        .max()
        .unwrap_or(13)
        .max("configuration".len());

    out.push_str(&format!(
        "{:<width$}  {:>6}  {:>12}  {:>12}  {:>12}  {:>12}  {:>10}\n",
        "configuration",
        "trials",
        "mean_ms",
        "std_ms",
        "min_ms",
        "max_ms",
        "vs_base_%",
        width = name_width
    ));

    for row in rows {
        out.push_str(&format!(
            "{:<width$}  {:>6}  {:>12.6}  {:>12}  {:>12.6}  {:>12.6}  {:>10}\n",
            row.configuration,
            row.trials,
            row.mean_time_ms,
            row.std_time_ms
                .map(|v| format!("{v:.6}"))
                .unwrap_or_else(|| "-".to_string()),
            row.min_time_ms,
            row.max_time_ms,
            row.time_overhead_vs_classical_pct
                .map(|v| format!("{v:.1}"))
                .unwrap_or_else(|| "-".to_string()),
            width = name_width
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::EnergyReadings;
    use tempfile::TempDir;

    fn record(configuration: &str, trial: u32, time_ms: f64) -> TrialRecord {
        TrialRecord::new(
            1_700_000_000.0,
            configuration,
            trial,
            time_ms,
            EnergyReadings::default(),
        )
    }

    fn records(configuration: &str, times: &[f64]) -> Vec<TrialRecord> {
        times
            .iter()
            .enumerate()
            .map(|(i, &t)| record(configuration, i as u32, t))
            .collect()
    }

    #[test]
    fn test_baseline_overhead_is_exactly_zero() {
        let mut set = records("classical_ecdh_software", &[0.05, 0.05]);
        set.extend(records("pqc_mlkem_software_ML-KEM-768", &[0.12, 0.12]));

        let rows = Aggregator::default().summarize(&set);
        assert_eq!(rows[0].configuration, "classical_ecdh_software");
        assert_eq!(rows[0].time_overhead_vs_classical_pct, Some(0.0));
    }

    #[test]
    fn test_overhead_end_to_end_scenario() {
        let mut set = records("classical_ecdh_software", &[0.05, 0.05, 0.05]);
        set.extend(records("pqc_mlkem_software_ML-KEM-768", &[0.12, 0.12, 0.12]));

        let rows = Aggregator::default().summarize(&set);
        let kem = rows
            .iter()
            .find(|r| r.configuration == "pqc_mlkem_software_ML-KEM-768")
            .unwrap();
        let overhead = kem.time_overhead_vs_classical_pct.unwrap();
        assert!((overhead - 140.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_baseline_yields_null_overheads() {
        let set = records("pqc_mlkem_software_ML-KEM-768", &[0.12, 0.13]);
        let rows = Aggregator::default().summarize(&set);
        assert!(rows[0].time_overhead_vs_classical_pct.is_none());
    }

    #[test]
    fn test_single_sample_std_is_null() {
        let set = records("openssl_ML-KEM-768_encaps", &[0.012]);
        let rows = Aggregator::default().summarize(&set);
        assert_eq!(rows[0].trials, 1);
        assert!(rows[0].std_time_ms.is_none());
        assert_eq!(rows[0].min_time_ms, 0.012);
        assert_eq!(rows[0].max_time_ms, 0.012);
    }

    #[test]
    fn test_sample_std_uses_n_minus_one() {
        let set = records("cfg", &[1.0, 3.0]);
        let rows = Aggregator::default().summarize(&set);
        // Sample std of {1, 3} is sqrt(2), not 1.
        assert!((rows[0].std_time_ms.unwrap() - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_sort_baseline_first_then_mean_ascending() {
        let mut set = records("slow_cfg", &[2.0, 2.0]);
        set.extend(records("fast_cfg", &[0.5, 0.5]));
        set.extend(records("classical_ecdh_software", &[1.0, 1.0]));

        let rows = Aggregator::default().summarize(&set);
        let names: Vec<&str> = rows.iter().map(|r| r.configuration.as_str()).collect();
        assert_eq!(
            names,
            ["classical_ecdh_software", "fast_cfg", "slow_cfg"]
        );
    }

    #[test]
    fn test_summarize_is_deterministic() {
        let mut set = records("classical_ecdh_software", &[0.05, 0.06]);
        set.extend(records("b_cfg", &[0.2, 0.2]));
        set.extend(records("a_cfg", &[0.2, 0.2]));

        let aggregator = Aggregator::default();
        let first = aggregator.summarize(&set);
        let second = aggregator.summarize(&set);
        assert_eq!(first, second);
        // Equal means keep first-seen order.
        assert_eq!(first[1].configuration, "b_cfg");
        assert_eq!(first[2].configuration, "a_cfg");
    }

    #[test]
    fn test_energy_gating_and_overhead() {
        let energized = |cfg: &str, time: f64, energy: f64| TrialRecord {
            energy_j: Some(energy),
            avg_current_ma: Some(40.0),
            peak_current_ma: Some(55.0),
            ..record(cfg, 0, time)
        };

        let set = vec![
            energized("classical_ecdh_software", 0.05, 0.001),
            energized("classical_ecdh_software", 0.05, 0.001),
            energized("pqc_mlkem_software_ML-KEM-768", 0.12, 0.003),
            energized("pqc_mlkem_software_ML-KEM-768", 0.12, 0.003),
            // A producer without hardware in the same store.
            record("openssl_X25519_keygen", 0, 0.007),
        ];

        let rows = Aggregator::default().summarize(&set);

        let kem = rows
            .iter()
            .find(|r| r.configuration == "pqc_mlkem_software_ML-KEM-768")
            .unwrap();
        let energy_overhead = kem.energy_overhead_vs_classical_pct.unwrap();
        assert!((energy_overhead - 200.0).abs() < 1e-9);
        assert_eq!(kem.mean_avg_current_ma, Some(40.0));

        // All-null group yields null energy aggregates, not zero.
        let external = rows
            .iter()
            .find(|r| r.configuration == "openssl_X25519_keygen")
            .unwrap();
        assert!(external.mean_energy_j.is_none());
        assert!(external.energy_overhead_vs_classical_pct.is_none());
        // Timing overhead still computed for the all-null-energy group.
        assert!(external.time_overhead_vs_classical_pct.is_some());
    }

    #[test]
    fn test_summary_csv_omits_energy_columns_without_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("processed/summary.csv");

        let set = records("classical_ecdh_software", &[0.05, 0.06]);
        let rows = Aggregator::default().summarize(&set);
        write_summary_csv(&path, &rows).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let header = raw.lines().next().unwrap();
        assert_eq!(
            header,
            "configuration,trials,mean_time_ms,std_time_ms,min_time_ms,max_time_ms,time_overhead_vs_classical_pct"
        );
        assert!(!raw.contains("energy"));
    }

    #[test]
    fn test_summary_csv_includes_energy_columns_with_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("summary.csv");

        let mut with_energy = record("classical_ecdh_software", 0, 0.05);
        with_energy.energy_j = Some(0.001);
        let rows = Aggregator::default().summarize(&[with_energy]);
        write_summary_csv(&path, &rows).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let header = raw.lines().next().unwrap();
        assert!(header.contains("mean_energy_J"));
        assert!(header.ends_with("energy_overhead_vs_classical_pct"));
    }

    #[test]
    fn test_summary_csv_output_is_byte_identical_across_runs() {
        let dir = TempDir::new().unwrap();
        let mut set = records("classical_ecdh_software", &[0.05, 0.06, 0.055]);
        set.extend(records("pqc_mlkem_software_ML-KEM-768", &[0.12, 0.11]));

        let aggregator = Aggregator::default();
        let path_a = dir.path().join("a.csv");
        let path_b = dir.path().join("b.csv");
        write_summary_csv(&path_a, &aggregator.summarize(&set)).unwrap();
        write_summary_csv(&path_b, &aggregator.summarize(&set)).unwrap();

        assert_eq!(
            std::fs::read(&path_a).unwrap(),
            std::fs::read(&path_b).unwrap()
        );
    }

    #[test]
    fn test_render_table_marks_missing_values() {
        let set = records("only_cfg", &[0.5]);
        let table = render_table(&Aggregator::default().summarize(&set));
        assert!(table.contains("only_cfg"));
        assert!(table.contains('-'));
    }
}
