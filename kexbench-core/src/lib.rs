// SPDX-License-Identifier: Apache-2.0

//! kexbench core library
//!
//! Measurement and aggregation harness for comparing classical
//! elliptic-curve Diffie-Hellman against post-quantum key-encapsulation
//! mechanisms. Provides the trial runner, the scoped measurement session,
//! the append-only CSV result store, a parser for `openssl speed` reports,
//! and the statistics aggregator. All execution is strictly sequential:
//! concurrent trials would share CPU, cache, and power state with the
//! quantity being measured.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod provider;
pub mod record;
pub mod runner;
pub mod session;
pub mod speed;
pub mod store;
pub mod sysenv;

// Re-export commonly used types
pub use aggregate::{render_table, write_summary_csv, Aggregator, ConfigurationSummary};
pub use config::BenchConfig;
pub use error::{BackendError, BenchError, BenchResult, ConfigError, StoreError, ToolError};
pub use provider::{MlKem, MlKemLevel, OperationProvider, X25519Exchange};
pub use record::TrialRecord;
pub use runner::{RunOutcome, TrialRunner};
pub use session::{EnergyReadings, Measurement, MeasurementSession};
pub use speed::{import_report, run_openssl_speed, Phase, SpeedReportParser};
pub use store::ResultStore;
pub use sysenv::SystemInfo;
