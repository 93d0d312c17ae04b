//! Custom error types for kexbench.
//!
//! All failures are explicit enum variants. Two outcomes deliberately have
//! no variant here: an external-tool report with no matching lines (the
//! caller gets an empty import, not an error) and an unresolved baseline
//! (overhead columns degrade to null).

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the benchmark harness.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("Backend failure: {0}")]
    Backend(#[from] BackendError),

    #[error("External tool failure: {0}")]
    Tool(#[from] ToolError),

    #[error("Result store failure: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// A cryptographic backend misbehaved. Fatal to the current trial run:
/// a broken backend produces meaningless timings, so no retry and no
/// partial record is written for the failing iteration.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Shared secret mismatch in {scheme} cycle")]
    SharedSecretMismatch { scheme: String },

    #[error("Unknown KEM level: {name}")]
    UnknownKemLevel { name: String },
}

/// The third-party benchmarking tool could not be run or produced nothing
/// usable. Distinct from a report that simply lacks a requested algorithm.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    NonZeroExit {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("{command} produced no output")]
    EmptyOutput { command: String },
}

/// Result store I/O and serialization failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Record serialization error: {0}")]
    Csv(#[from] csv::Error),
}

/// Configuration file errors. Invalid plans fail fast before any trial runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    Parse { message: String },

    #[error("Invalid field value: {field} - {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Result type alias using BenchError.
pub type BenchResult<T> = Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::SharedSecretMismatch {
            scheme: "x25519".to_string(),
        };
        assert!(err.to_string().contains("x25519"));
    }

    #[test]
    fn test_error_chain() {
        let tool_err = ToolError::NonZeroExit {
            command: "openssl speed".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "unknown option".to_string(),
        };
        let bench_err: BenchError = tool_err.into();
        assert!(matches!(bench_err, BenchError::Tool(_)));
    }
}
