// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Snapshot Persistence
//!
//! The table is written wholesale to a JSON file (`identity -> {data,
//! timestamp}`) a short while after a push. Pushes that arrive while a write
//! is pending share it, so a burst costs one write.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::RelayError;
use crate::metrics::RelayMetrics;
use crate::store::{RecordTable, StoredRecord};

/// Reads a snapshot. A missing or unreadable file yields an empty table.
pub fn load_snapshot(path: &Path) -> BTreeMap<String, StoredRecord> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("No snapshot at {}, starting empty", path.display());
            return BTreeMap::new();
        }
        Err(e) => {
            warn!("Cannot read snapshot {}: {}, starting empty", path.display(), e);
            return BTreeMap::new();
        }
    };

    match serde_json::from_str::<BTreeMap<String, StoredRecord>>(&contents) {
        Ok(records) => {
            info!("Loaded {} records from {}", records.len(), path.display());
            records
        }
        Err(e) => {
            warn!("Corrupt snapshot {}: {}, starting empty", path.display(), e);
            BTreeMap::new()
        }
    }
}

/// Writes a snapshot through a temporary file and a rename.
pub fn write_snapshot(
    path: &Path,
    records: &BTreeMap<String, StoredRecord>,
) -> Result<(), RelayError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let contents = serde_json::to_vec(records)?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, contents)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Debounced snapshot writer for one table.
pub struct SnapshotScheduler {
    path: PathBuf,
    debounce: Duration,
    table: Arc<RecordTable>,
    metrics: RelayMetrics,
    armed: AtomicBool,
    writes: AtomicU64,
    /// Held for the whole copy-and-write; writers share the temp path.
    write_lock: Mutex<()>,
}

impl SnapshotScheduler {
    pub fn new(
        path: impl Into<PathBuf>,
        debounce: Duration,
        table: Arc<RecordTable>,
        metrics: RelayMetrics,
    ) -> Arc<Self> {
        Arc::new(SnapshotScheduler {
            path: path.into(),
            debounce,
            table,
            metrics,
            armed: AtomicBool::new(false),
            writes: AtomicU64::new(0),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of snapshots written so far.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// True while a write is scheduled but not started.
    pub fn is_pending(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// Schedules a write after the debounce delay unless one is pending.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(self: &Arc<Self>) {
        if self.armed.swap(true, Ordering::SeqCst) {
            return;
        }

        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(scheduler.debounce).await;
            // Disarm before copying so later pushes schedule a new write
            scheduler.armed.store(false, Ordering::SeqCst);
            if let Err(e) = scheduler.write_now().await {
                warn!("Snapshot write to {} failed: {}", scheduler.path.display(), e);
            }
        });
    }

    /// Writes the current table immediately.
    ///
    /// Writes are serialized, and the table is copied once the previous
    /// write has finished, so the last writer always stores the newest table.
    pub async fn write_now(&self) -> Result<(), RelayError> {
        let _guard = self.write_lock.lock().await;
        let records = self.table.snapshot();
        let count = records.len();
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_snapshot(&path, &records))
            .await
            .map_err(|e| RelayError::Task(e.to_string()))??;

        self.writes.fetch_add(1, Ordering::SeqCst);
        self.metrics.snapshot_writes.inc();
        debug!("Snapshot written ({} records)", count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub").join("snap.json");
        let mut records = BTreeMap::new();
        records.insert(
            "abc".to_string(),
            StoredRecord {
                data: "payload".into(),
                timestamp: 100,
            },
        );

        write_snapshot(&path, &records).unwrap();
        assert_eq!(load_snapshot(&path), records);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_snapshot_file_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snap.json");
        let mut records = BTreeMap::new();
        records.insert(
            "abc".to_string(),
            StoredRecord {
                data: "payload".into(),
                timestamp: 7,
            },
        );
        write_snapshot(&path, &records).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["abc"]["data"], "payload");
        assert_eq!(value["abc"]["timestamp"], 7);
    }
}
