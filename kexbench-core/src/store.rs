// SPDX-License-Identifier: Apache-2.0

//! Append-only CSV result store.
//!
//! Every append is a self-contained open-write-close cycle, so a crashing
//! run loses at most its in-flight record. There is no update or delete:
//! corrections are made by appending new configurations, never by
//! rewriting history. Single-writer: producers must not run concurrently
//! against the same store.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::record::TrialRecord;

/// Column header, kept in lockstep with the `TrialRecord` field order.
const HEADER: [&str; 7] = [
    "timestamp",
    "configuration",
    "trial",
    "execution_time_ms",
    "energy_J",
    "avg_current_mA",
    "peak_current_mA",
];

/// Handle to the structured trial log at a fixed path.
#[derive(Debug, Clone)]
pub struct ResultStore {
    path: PathBuf,
}

impl ResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Idempotently create the log with its header row. Never truncates an
    /// existing log.
    pub fn ensure(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                context: "creating store directory",
                source: e,
            })?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .map_err(|e| StoreError::Io {
                context: "creating store file",
                source: e,
            })?;

        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(HEADER)?;
        writer.flush().map_err(|e| StoreError::Io {
            context: "flushing store header",
            source: e,
        })?;

        tracing::debug!(path = %self.path.display(), "Created result store");
        Ok(())
    }

    /// Append exactly one record. Opens and closes the file per call.
    pub fn append(&self, record: &TrialRecord) -> Result<(), StoreError> {
        self.ensure()?;

        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::Io {
                context: "opening store for append",
                source: e,
            })?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush().map_err(|e| StoreError::Io {
            context: "flushing appended record",
            source: e,
        })?;

        Ok(())
    }

    /// Read every record ever appended, in append order.
    pub fn read_all(&self) -> Result<Vec<TrialRecord>, StoreError> {
        let mut reader = csv::Reader::from_path(&self.path).map_err(StoreError::Csv)?;
        let mut records = Vec::new();
        for row in reader.deserialize() {
            records.push(row?);
        }
        Ok(records)
    }
}
