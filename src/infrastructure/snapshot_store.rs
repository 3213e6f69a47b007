//! Snapshot persistence
//!
//! One harvest run becomes `<prefix>_<YYYYmmdd_HHMMSS>.json` (and optionally a
//! `.csv` with the same stem) in the data directory. Loading walks the same
//! directory so downstream views can fold every run on disk.

#![allow(clippy::uninlined_format_args)]

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{PersistedSnapshot, Snapshot};
use crate::infrastructure::config::OutputConfig;

const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid snapshot JSON in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV export to {path:?} failed: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Cannot derive a capture time for {path:?}")]
    InvalidFileName { path: PathBuf },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Directory of timestamped snapshot exports
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    data_dir: PathBuf,
    file_prefix: String,
}

impl SnapshotStore {
    pub fn new(data_dir: impl Into<PathBuf>, file_prefix: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            file_prefix: file_prefix.into(),
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(config.data_dir.clone(), config.file_prefix.clone())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, snapshot: &Snapshot, extension: &str) -> PathBuf {
        self.data_dir.join(format!(
            "{}_{}.{}",
            self.file_prefix,
            snapshot.captured_at.format(STAMP_FORMAT),
            extension
        ))
    }

    fn ensure_dir(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.data_dir).map_err(|source| StoreError::Io {
            path: self.data_dir.clone(),
            source,
        })
    }

    /// Write the snapshot as pretty-printed JSON keyed by collection id
    pub fn write_json(&self, snapshot: &Snapshot) -> StoreResult<PathBuf> {
        self.ensure_dir()?;
        let path = self.path_for(snapshot, "json");

        let json = serde_json::to_string_pretty(&snapshot.to_persisted()).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        info!("💾 Saved {} records to {:?}", snapshot.total_records(), path);
        Ok(path)
    }

    /// Write the flattened rows as CSV. Nothing is written for an empty snapshot.
    pub fn write_csv(&self, snapshot: &Snapshot) -> StoreResult<Option<PathBuf>> {
        let rows = snapshot.tabular_rows();
        if rows.is_empty() {
            debug!("Snapshot has no rows, skipping CSV export");
            return Ok(None);
        }

        self.ensure_dir()?;
        let path = self.path_for(snapshot, "csv");
        let csv_error = |source| StoreError::Csv {
            path: path.clone(),
            source,
        };

        let mut writer = csv::Writer::from_path(&path).map_err(csv_error)?;
        for row in &rows {
            writer.serialize(row).map_err(csv_error)?;
        }
        writer.flush().map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        info!("💾 Saved {} rows to {:?}", rows.len(), path);
        Ok(Some(path))
    }

    /// Read one JSON export back.
    ///
    /// The capture time comes from the file name stamp, or from the newest
    /// record when the name carries none.
    pub fn load_json(&self, path: &Path) -> StoreResult<Snapshot> {
        let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let persisted: PersistedSnapshot = serde_json::from_str(&content).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        let captured_at = self
            .stamp_of(path)
            .or_else(|| persisted.values().flatten().map(|r| r.scraped_at).max())
            .ok_or_else(|| StoreError::InvalidFileName {
                path: path.to_path_buf(),
            })?;

        Ok(Snapshot::from_persisted(persisted, captured_at))
    }

    fn stamp_of(&self, path: &Path) -> Option<DateTime<Utc>> {
        let stem = path.file_stem()?.to_str()?;
        let stamp = stem.strip_prefix(&self.file_prefix)?.strip_prefix('_')?;
        NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Every JSON export in the data directory, oldest file name first.
    ///
    /// Files that cannot be read are logged and skipped.
    pub fn load_all(&self) -> StoreResult<Vec<Snapshot>> {
        if !self.data_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.data_dir).map_err(|source| StoreError::Io {
            path: self.data_dir.clone(),
            source,
        })?;

        let prefix = format!("{}_", self.file_prefix);
        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| name.starts_with(&prefix) && name.ends_with(".json"))
            })
            .collect();
        paths.sort();

        let mut snapshots = Vec::with_capacity(paths.len());
        for path in &paths {
            match self.load_json(path) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => warn!("Skipping unreadable snapshot: {}", e),
            }
        }

        debug!("Loaded {} of {} snapshot files from {:?}", snapshots.len(), paths.len(), self.data_dir);
        Ok(snapshots)
    }
}
