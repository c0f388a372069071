// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-memory stores, for tests and for running without a usable disk.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{RecordStore, StorageError};
use crate::crypto::Envelope;

#[derive(Debug, Default)]
struct MemoryState {
    records: HashMap<String, Envelope>,
    phrase: Option<String>,
}

/// Volatile store. Clones share contents, which lets tests hand the same
/// "shared" tier to two engines.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|s| s.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".into()))
    }
}

impl RecordStore for MemoryStore {
    fn load(&self, identity: &str) -> Result<Option<Envelope>, StorageError> {
        Ok(self.lock()?.records.get(identity).cloned())
    }

    fn store(&self, identity: &str, envelope: &Envelope) -> Result<(), StorageError> {
        self.lock()?
            .records
            .insert(identity.to_string(), envelope.clone());
        Ok(())
    }

    fn remove(&self, identity: &str) -> Result<(), StorageError> {
        self.lock()?.records.remove(identity);
        Ok(())
    }

    fn save_phrase(&self, phrase: &str) -> Result<(), StorageError> {
        self.lock()?.phrase = Some(phrase.to_string());
        Ok(())
    }

    fn load_phrase(&self) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.phrase.clone())
    }

    fn clear_phrase(&self) -> Result<(), StorageError> {
        self.lock()?.phrase = None;
        Ok(())
    }
}

/// A store that refuses every operation, like a blocked browser store or an
/// unwritable disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStore;

impl UnavailableStore {
    fn refuse<T>() -> Result<T, StorageError> {
        Err(StorageError::Unavailable("store is not available".into()))
    }
}

impl RecordStore for UnavailableStore {
    fn load(&self, _identity: &str) -> Result<Option<Envelope>, StorageError> {
        Self::refuse()
    }

    fn store(&self, _identity: &str, _envelope: &Envelope) -> Result<(), StorageError> {
        Self::refuse()
    }

    fn remove(&self, _identity: &str) -> Result<(), StorageError> {
        Self::refuse()
    }

    fn save_phrase(&self, _phrase: &str) -> Result<(), StorageError> {
        Self::refuse()
    }

    fn load_phrase(&self) -> Result<Option<String>, StorageError> {
        Self::refuse()
    }
}
