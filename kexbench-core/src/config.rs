// SPDX-License-Identifier: Apache-2.0

//! YAML experiment-plan configuration.
//!
//! Parsed into raw serde structs, then validated field by field before any
//! trial runs; an invalid plan fails fast instead of producing a half
//! populated result log.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::aggregate::Aggregator;
use crate::error::ConfigError;
use crate::provider::MlKemLevel;

/// Raw plan as parsed from YAML (before validation).
#[derive(Debug, Deserialize)]
struct RawPlan {
    #[serde(default = "default_output")]
    output: String,
    #[serde(default = "default_summary")]
    summary: String,
    #[serde(default = "default_baseline")]
    baseline: String,
    #[serde(default = "default_trials")]
    trials: u32,
    #[serde(default = "default_warmup")]
    warmup: u32,
    #[serde(default = "default_kem_batch_size")]
    kem_batch_size: u32,
    #[serde(default = "default_kem_levels")]
    kem_levels: Vec<String>,
    #[serde(default)]
    openssl: RawOpensslSection,
}

#[derive(Debug, Deserialize)]
struct RawOpensslSection {
    #[serde(default = "default_openssl_seconds")]
    seconds: u32,
    #[serde(default = "default_openssl_algorithms")]
    algorithms: Vec<String>,
}

fn default_output() -> String {
    "data/raw/results.csv".to_string()
}

fn default_summary() -> String {
    "data/processed/summary.csv".to_string()
}

fn default_baseline() -> String {
    Aggregator::DEFAULT_BASELINE.to_string()
}

fn default_trials() -> u32 {
    200
}

fn default_warmup() -> u32 {
    5
}

fn default_kem_batch_size() -> u32 {
    50
}

fn default_kem_levels() -> Vec<String> {
    vec!["ML-KEM-768".to_string()]
}

fn default_openssl_seconds() -> u32 {
    3
}

fn default_openssl_algorithms() -> Vec<String> {
    ["X25519", "ML-KEM-512", "ML-KEM-768", "ML-KEM-1024"]
        .map(String::from)
        .to_vec()
}

impl Default for RawOpensslSection {
    fn default() -> Self {
        Self {
            seconds: default_openssl_seconds(),
            algorithms: default_openssl_algorithms(),
        }
    }
}

/// Validated experiment plan.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub output: PathBuf,
    pub summary: PathBuf,
    pub baseline: String,
    pub trials: u32,
    pub warmup: u32,
    pub kem_batch_size: u32,
    pub kem_levels: Vec<MlKemLevel>,
    pub openssl: OpensslConfig,
}

/// Validated external-tool section.
#[derive(Debug, Clone)]
pub struct OpensslConfig {
    pub seconds: u32,
    pub algorithms: Vec<String>,
}

impl BenchConfig {
    /// Load and validate a plan from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;
        Self::load_str(&text)
    }

    /// Parse and validate a plan from YAML text.
    pub fn load_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawPlan = serde_yaml::from_str(text).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        Self::validate(raw)
    }

    /// Plan with all defaults, used when no config file is given.
    pub fn defaults() -> Self {
        Self {
            output: PathBuf::from(default_output()),
            summary: PathBuf::from(default_summary()),
            baseline: default_baseline(),
            trials: default_trials(),
            warmup: default_warmup(),
            kem_batch_size: default_kem_batch_size(),
            kem_levels: vec![MlKemLevel::MlKem768],
            openssl: OpensslConfig {
                seconds: default_openssl_seconds(),
                algorithms: default_openssl_algorithms(),
            },
        }
    }

    fn validate(raw: RawPlan) -> Result<Self, ConfigError> {
        if raw.trials == 0 {
            return Err(ConfigError::Invalid {
                field: "trials",
                reason: "must be at least 1".to_string(),
            });
        }
        if raw.kem_batch_size == 0 {
            return Err(ConfigError::Invalid {
                field: "kem_batch_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if raw.baseline.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "baseline",
                reason: "must name a configuration".to_string(),
            });
        }
        if raw.openssl.seconds == 0 {
            return Err(ConfigError::Invalid {
                field: "openssl.seconds",
                reason: "must be at least 1".to_string(),
            });
        }

        let kem_levels = raw
            .kem_levels
            .iter()
            .map(|name| {
                MlKemLevel::from_name(name).map_err(|_| ConfigError::Invalid {
                    field: "kem_levels",
                    reason: format!("unknown level: {name}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            output: PathBuf::from(raw.output),
            summary: PathBuf::from(raw.summary),
            baseline: raw.baseline,
            trials: raw.trials,
            warmup: raw.warmup,
            kem_batch_size: raw.kem_batch_size,
            kem_levels,
            openssl: OpensslConfig {
                seconds: raw.openssl.seconds,
                algorithms: raw.openssl.algorithms,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BenchConfig::defaults();
        assert_eq!(config.trials, 200);
        assert_eq!(config.warmup, 5);
        assert_eq!(config.kem_batch_size, 50);
        assert_eq!(config.baseline, "classical_ecdh_software");
        assert_eq!(config.kem_levels, vec![MlKemLevel::MlKem768]);
        assert_eq!(config.openssl.seconds, 3);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = BenchConfig::load_str(
            "trials: 20\nkem_levels: [ML-KEM-512, ML-KEM-1024]\n",
        )
        .unwrap();
        assert_eq!(config.trials, 20);
        assert_eq!(config.warmup, 5);
        assert_eq!(
            config.kem_levels,
            vec![MlKemLevel::MlKem512, MlKemLevel::MlKem1024]
        );
    }

    #[test]
    fn test_zero_trials_rejected() {
        let err = BenchConfig::load_str("trials: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "trials", .. }));
    }

    #[test]
    fn test_unknown_kem_level_rejected() {
        let err = BenchConfig::load_str("kem_levels: [Kyber768]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "kem_levels", .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = BenchConfig::load_file("/nonexistent/plan.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }
}
