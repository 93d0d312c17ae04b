// SPDX-License-Identifier: Apache-2.0

//! Scoped measurement session around one timed region.
//!
//! A session captures a start instant on acquisition and an end instant on
//! `stop`, which the trial runner calls unconditionally before propagating
//! any failure from inside the region. Energy readings are a stable
//! placeholder contract: the software-only session returns all-null values
//! that a hardware-backed implementation can later populate without
//! changing callers.

use std::time::{Duration, Instant};

/// Optional energy/current observations for one timed region.
///
/// All fields are `None` until a hardware measurement backend exists.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnergyReadings {
    pub energy_j: Option<f64>,
    pub avg_current_ma: Option<f64>,
    pub peak_current_ma: Option<f64>,
}

/// A completed measurement: wall-clock duration plus energy readings.
#[derive(Debug, Clone, Copy)]
pub struct Measurement {
    pub elapsed: Duration,
    pub energy: EnergyReadings,
}

impl Measurement {
    /// Elapsed wall-clock time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}

/// In-flight measurement session. Timing only; the session itself never
/// fails and never inspects the outcome of the work it brackets.
pub struct MeasurementSession {
    start: Instant,
}

impl MeasurementSession {
    /// Open the timed region.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Close the timed region and return the measurement.
    pub fn stop(self) -> Measurement {
        let elapsed = self.start.elapsed();
        Measurement {
            elapsed,
            energy: EnergyReadings::default(),
        }
    }
}
