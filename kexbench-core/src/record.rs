// SPDX-License-Identifier: Apache-2.0

//! The trial record schema shared by every producer.
//!
//! Both the in-process trial runner and the external-tool importer emit
//! exactly this shape, so the aggregator never branches on where a row
//! came from. Energy fields are nullable columns that a future hardware
//! measurement backend fills in; the software-only session leaves them
//! empty.

use serde::{Deserialize, Serialize};

use crate::session::EnergyReadings;

/// One timing observation, as persisted to the result log.
///
/// Field order here is the CSV column order. Absent optional values
/// serialize as empty fields, never as sentinel numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Wall-clock time the trial was recorded, seconds since the Unix epoch.
    pub timestamp: f64,
    /// Identifier of the scheme+backend+variant under test,
    /// e.g. `classical_ecdh_software` or `openssl_ML-KEM-768_encaps`.
    pub configuration: String,
    /// Trial index, unique within a configuration for in-process runs.
    /// Always 0 for rows synthesized from an external tool's aggregate.
    pub trial: u32,
    /// Elapsed time per logical operation in milliseconds. For batched
    /// trials this is the mean per-operation time within the batch.
    pub execution_time_ms: f64,
    #[serde(rename = "energy_J")]
    pub energy_j: Option<f64>,
    #[serde(rename = "avg_current_mA")]
    pub avg_current_ma: Option<f64>,
    #[serde(rename = "peak_current_mA")]
    pub peak_current_ma: Option<f64>,
}

impl TrialRecord {
    /// Build a record from a measured trial and the session's energy readings.
    pub fn new(
        timestamp: f64,
        configuration: impl Into<String>,
        trial: u32,
        execution_time_ms: f64,
        energy: EnergyReadings,
    ) -> Self {
        Self {
            timestamp,
            configuration: configuration.into(),
            trial,
            execution_time_ms,
            energy_j: energy.energy_j,
            avg_current_ma: energy.avg_current_ma,
            peak_current_ma: energy.peak_current_ma,
        }
    }

    /// True if any energy field carries a value.
    pub fn has_energy(&self) -> bool {
        self.energy_j.is_some() || self.avg_current_ma.is_some() || self.peak_current_ma.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_null_energy_session() {
        let record = TrialRecord::new(
            1_700_000_000.5,
            "classical_ecdh_software",
            3,
            0.052,
            EnergyReadings::default(),
        );
        assert_eq!(record.trial, 3);
        assert!(!record.has_energy());
    }

    #[test]
    fn test_record_csv_field_order() {
        let mut writer = csv::Writer::from_writer(vec![]);
        writer
            .serialize(TrialRecord::new(
                1.0,
                "cfg",
                0,
                0.5,
                EnergyReadings::default(),
            ))
            .unwrap();
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let header = out.lines().next().unwrap();
        assert_eq!(
            header,
            "timestamp,configuration,trial,execution_time_ms,energy_J,avg_current_mA,peak_current_mA"
        );
        // Null energy fields serialize as empty cells.
        assert!(out.lines().nth(1).unwrap().ends_with("0.5,,,"));
    }
}
