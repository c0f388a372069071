// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Persistent Storage Module
//!
//! Local tiers for the profile envelope:
//! - tier 1, [`Storage`]: the device's SQLite database, which also remembers
//!   the recovery phrase;
//! - tier 2, [`FallbackStore`]: a shared directory of JSON files that stays
//!   readable when tier 1 is empty or unavailable.
//!
//! Both only ever hold envelopes; decryption happens in the sync engine.

pub mod error;
pub mod fallback;
pub mod memory;
pub mod migration;

pub use error::StorageError;
pub use fallback::FallbackStore;
pub use memory::{MemoryStore, UnavailableStore};

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::crypto::Envelope;

const PHRASE_SETTING: &str = "recovery_phrase";

/// A keyed store of envelopes, one per identity.
pub trait RecordStore: Send {
    /// Loads the envelope stored for `identity`.
    fn load(&self, identity: &str) -> Result<Option<Envelope>, StorageError>;

    /// Stores (or replaces) the envelope for `identity`.
    fn store(&self, identity: &str, envelope: &Envelope) -> Result<(), StorageError>;

    /// Removes the envelope for `identity`. Missing entries are not an error.
    fn remove(&self, identity: &str) -> Result<(), StorageError>;

    /// Remembers the recovery phrase. Stores that can't are silently skipped.
    fn save_phrase(&self, _phrase: &str) -> Result<(), StorageError> {
        Ok(())
    }

    /// Returns the remembered recovery phrase, if any.
    fn load_phrase(&self) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    /// Forgets the remembered recovery phrase.
    fn clear_phrase(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// SQLite-based storage implementation (tier 1).
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Opens or creates a storage database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let storage = Storage { conn };
        storage.run_migrations()?;
        Ok(storage)
    }

    /// Creates an in-memory storage (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Storage { conn };
        storage.run_migrations()?;
        Ok(storage)
    }

    /// Runs all pending schema migrations.
    fn run_migrations(&self) -> Result<(), StorageError> {
        let migrations = migration::all_migrations();
        migration::MigrationRunner::run(&self.conn, &migrations)
    }

    /// Returns the current schema version.
    pub fn schema_version(&self) -> Result<u32, StorageError> {
        migration::MigrationRunner::current_version(&self.conn)
    }

    /// Number of stored envelopes.
    pub fn record_count(&self) -> Result<usize, StorageError> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM profile_records", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl RecordStore for Storage {
    fn load(&self, identity: &str) -> Result<Option<Envelope>, StorageError> {
        let envelope = self
            .conn
            .query_row(
                "SELECT version, ciphertext, iv FROM profile_records WHERE identity = ?1",
                params![identity],
                |row| {
                    Ok(Envelope {
                        version: row.get(0)?,
                        ciphertext: row.get(1)?,
                        iv: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(envelope)
    }

    fn store(&self, identity: &str, envelope: &Envelope) -> Result<(), StorageError> {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        self.conn.execute(
            "INSERT INTO profile_records (identity, version, ciphertext, iv, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(identity) DO UPDATE SET
                version = excluded.version,
                ciphertext = excluded.ciphertext,
                iv = excluded.iv,
                updated_at = excluded.updated_at",
            params![
                identity,
                envelope.version,
                envelope.ciphertext,
                envelope.iv,
                now
            ],
        )?;
        Ok(())
    }

    fn remove(&self, identity: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "DELETE FROM profile_records WHERE identity = ?1",
            params![identity],
        )?;
        Ok(())
    }

    fn save_phrase(&self, phrase: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![PHRASE_SETTING, phrase],
        )?;
        Ok(())
    }

    fn load_phrase(&self) -> Result<Option<String>, StorageError> {
        let phrase = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![PHRASE_SETTING],
                |row| row.get(0),
            )
            .optional()?;
        Ok(phrase)
    }

    fn clear_phrase(&self) -> Result<(), StorageError> {
        self.conn.execute(
            "DELETE FROM settings WHERE key = ?1",
            params![PHRASE_SETTING],
        )?;
        Ok(())
    }
}
