// SPDX-License-Identifier: Apache-2.0

//! Trial runner: warmed-up, batched timing trials against a provider.
//!
//! Each trial times one batch of complete operation cycles inside a
//! measurement session and records the mean per-operation time. Batching
//! amortizes timer resolution and per-call overhead at microsecond scale,
//! at the accepted cost that the aggregator's standard deviation then
//! measures inter-batch variance rather than per-call variance. The number
//! of persisted rows is bounded by `trials`, not `trials * batch_size`.

use chrono::Utc;

use crate::error::BenchError;
use crate::provider::OperationProvider;
use crate::record::TrialRecord;
use crate::session::MeasurementSession;
use crate::store::ResultStore;

/// Summary of a completed run, for logging.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub configuration: String,
    pub trials: u32,
    pub mean_time_ms: f64,
}

/// Runs warmup plus a fixed number of batched, timed trials for one
/// configuration. Trials execute strictly sequentially; concurrent trials
/// would share CPU and cache state with the quantity being measured.
pub struct TrialRunner {
    trials: u32,
    warmup: u32,
    batch_size: u32,
}

impl TrialRunner {
    pub fn new() -> Self {
        Self {
            trials: 200,
            warmup: 5,
            batch_size: 1,
        }
    }

    /// Set the number of measured trials.
    pub fn trials(mut self, trials: u32) -> Self {
        self.trials = trials;
        self
    }

    /// Set the number of discarded warmup cycles.
    pub fn warmup(mut self, warmup: u32) -> Self {
        self.warmup = warmup;
        self
    }

    /// Set the number of operation cycles timed per trial.
    pub fn batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Run the full warmup + trial loop, appending one record per trial.
    ///
    /// A provider failure aborts the whole run with no record for the
    /// failing iteration: a shared-secret mismatch means the backend is
    /// broken, and a silently skipped trial would corrupt the sample count.
    pub fn run(
        &self,
        provider: &dyn OperationProvider,
        store: &ResultStore,
    ) -> Result<RunOutcome, BenchError> {
        let configuration = provider.configuration().to_string();

        tracing::info!(
            configuration = %configuration,
            trials = self.trials,
            warmup = self.warmup,
            batch_size = self.batch_size,
            "Starting trial run"
        );

        // Warmup cycles eliminate cold-start skew (lazy init, cache warm).
        for _ in 0..self.warmup {
            provider.run_cycle()?;
        }

        store.ensure()?;

        let mut total_ms = 0.0;
        for trial in 0..self.trials {
            let session = MeasurementSession::start();
            let mut outcome = Ok(());
            for _ in 0..self.batch_size {
                outcome = provider.run_cycle();
                if outcome.is_err() {
                    break;
                }
            }
            // The end boundary is captured even on failure; whether to
            // still emit a record is decided here, not by the session.
            let measurement = session.stop();
            outcome?;

            let execution_time_ms = measurement.elapsed_ms() / f64::from(self.batch_size);
            total_ms += execution_time_ms;

            let record = TrialRecord::new(
                epoch_seconds(),
                &configuration,
                trial,
                execution_time_ms,
                measurement.energy,
            );
            store.append(&record)?;
        }

        let mean_time_ms = total_ms / f64::from(self.trials.max(1));
        tracing::info!(
            configuration = %configuration,
            trials = self.trials,
            mean_time_ms = mean_time_ms,
            "Completed trial run"
        );

        Ok(RunOutcome {
            configuration,
            trials: self.trials,
            mean_time_ms,
        })
    }
}

impl Default for TrialRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Current wall-clock time as fractional seconds since the Unix epoch.
fn epoch_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
