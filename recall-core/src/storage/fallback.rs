// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Fallback Store (tier 2)
//!
//! One JSON file per identity in a directory shared between contexts that
//! don't share tier 1. Writes go through a temporary file and a rename so a
//! reader never sees half an envelope.

use std::path::{Path, PathBuf};

use super::{RecordStore, StorageError};
use crate::crypto::Envelope;

/// Directory-backed envelope store.
#[derive(Debug, Clone)]
pub struct FallbackStore {
    path: PathBuf,
}

impl FallbackStore {
    /// Creates a store rooted at `path`. The directory is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FallbackStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record_path(&self, identity: &str) -> PathBuf {
        // Sanitize the name to prevent path traversal
        let safe_name = identity
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect::<String>();
        self.path.join(format!("{}.json", safe_name))
    }
}

impl RecordStore for FallbackStore {
    fn load(&self, identity: &str) -> Result<Option<Envelope>, StorageError> {
        let file_path = self.record_path(identity);

        let contents = match std::fs::read_to_string(&file_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let envelope = serde_json::from_str(&contents)
            .map_err(|e| StorageError::Serialization(format!("{}: {}", file_path.display(), e)))?;
        Ok(Some(envelope))
    }

    fn store(&self, identity: &str, envelope: &Envelope) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.path)?;

        let contents = serde_json::to_vec(envelope)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let file_path = self.record_path(identity);
        let tmp_path = file_path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &contents)?;
        std::fs::rename(&tmp_path, &file_path)?;
        Ok(())
    }

    fn remove(&self, identity: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.record_path(identity)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// INLINE_TEST_REQUIRED: Tests private record_path sanitizing
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_path_is_sanitized() {
        let store = FallbackStore::new("/tmp/recall");
        let path = store.record_path("../../etc/passwd");
        assert_eq!(path, PathBuf::from("/tmp/recall/______etc_passwd.json"));
    }

    #[test]
    fn test_record_path_keeps_hex_and_probe_ids() {
        let store = FallbackStore::new("/tmp/recall");
        assert_eq!(
            store.record_path("probe-ab12"),
            PathBuf::from("/tmp/recall/probe-ab12.json")
        );
    }
}
