// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Record Table
//!
//! The relay keeps one opaque payload per identity. The latest push wins;
//! the relay never looks at timestamps beyond storing them.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// What the relay holds for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// The envelope payload, opaque to the relay.
    pub data: String,
    /// Client supplied, or arrival time in milliseconds.
    pub timestamp: i64,
}

/// Identity-keyed table shared by all connections.
#[derive(Debug, Default)]
pub struct RecordTable {
    records: Mutex<BTreeMap<String, StoredRecord>>,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table pre-filled from a snapshot.
    pub fn from_records(records: BTreeMap<String, StoredRecord>) -> Self {
        RecordTable {
            records: Mutex::new(records),
        }
    }

    /// Inserts or replaces the record for `identity`.
    pub fn upsert(&self, identity: &str, record: StoredRecord) {
        self.records.lock().insert(identity.to_string(), record);
    }

    pub fn get(&self, identity: &str) -> Option<StoredRecord> {
        self.records.lock().get(identity).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Copy of the whole table, for snapshotting.
    pub fn snapshot(&self) -> BTreeMap<String, StoredRecord> {
        self.records.lock().clone()
    }
}
