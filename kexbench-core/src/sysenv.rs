// SPDX-License-Identifier: Apache-2.0

//! Host environment capture.
//!
//! Timing numbers are only comparable within one machine, so each run
//! snapshots the host next to the result store. This is metadata about a
//! run, not part of the trial record schema.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sysinfo::System;

use crate::error::StoreError;

/// System information captured at run time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub captured_at: DateTime<Utc>,
    pub os: String,
    pub os_version: String,
    pub kernel_version: Option<String>,
    pub cpu_model: String,
    pub cpu_cores: usize,
    pub memory_bytes: u64,
    pub hostname: String,
}

impl SystemInfo {
    /// Collect current system information.
    pub fn collect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        Self {
            captured_at: Utc::now(),
            os: System::name().unwrap_or_else(|| "Unknown".to_string()),
            os_version: System::os_version().unwrap_or_else(|| "Unknown".to_string()),
            kernel_version: System::kernel_version(),
            cpu_model: sys
                .cpus()
                .first()
                .map(|cpu| cpu.brand().to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            cpu_cores: sys.cpus().len(),
            memory_bytes: sys.total_memory(),
            hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
        }
    }

    /// Write the snapshot as `environment.json` in the given directory.
    /// Returns the path written.
    pub fn save_next_to(&self, store_dir: &Path) -> Result<PathBuf, StoreError> {
        std::fs::create_dir_all(store_dir).map_err(|e| StoreError::Io {
            context: "creating environment directory",
            source: e,
        })?;
        let path = store_dir.join("environment.json");
        let json = serde_json::to_string_pretty(self).map_err(|e| StoreError::Io {
            context: "serializing environment snapshot",
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
        std::fs::write(&path, json).map_err(|e| StoreError::Io {
            context: "writing environment snapshot",
            source: e,
        })?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_has_basic_fields() {
        let info = SystemInfo::collect();
        assert!(!info.os.is_empty());
        assert!(info.cpu_cores > 0);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let info = SystemInfo::collect();
        let path = info.save_next_to(dir.path()).unwrap();

        let loaded: SystemInfo =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(loaded.hostname, info.hostname);
    }
}
