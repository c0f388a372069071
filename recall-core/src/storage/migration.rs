// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Schema Migrations
//!
//! Tier 1 keeps its schema version in `schema_version`. Pending steps run in
//! one transaction, so a failing step leaves the previous schema in place.

use rusqlite::{params, Connection, OptionalExtension};

use super::StorageError;

/// One schema step.
pub struct Migration {
    /// Starts at 1 and increases by step.
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

pub struct MigrationRunner;

impl MigrationRunner {
    /// Applies every migration newer than the stored version.
    pub fn run(conn: &Connection, migrations: &[Migration]) -> Result<(), StorageError> {
        conn.execute_batch(SCHEMA_VERSION_TABLE)?;

        let applied = Self::current_version(conn)?;
        let mut last = applied;
        let mut pending = Vec::new();
        for migration in migrations.iter().filter(|m| m.version > applied) {
            if migration.version <= last {
                return Err(StorageError::Migration(format!(
                    "migration v{} listed after v{}",
                    migration.version, last
                )));
            }
            last = migration.version;
            pending.push(migration);
        }
        if pending.is_empty() {
            return Ok(());
        }

        let tx = conn.unchecked_transaction()?;
        let applied_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        for migration in pending {
            tx.execute_batch(migration.sql).map_err(|e| {
                StorageError::Migration(format!(
                    "v{} '{}' failed: {}",
                    migration.version, migration.name, e
                ))
            })?;
            tx.execute(
                "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
                params![migration.version, applied_at],
            )?;
        }

        // Dropping an uncommitted transaction rolls it back
        tx.commit()?;
        Ok(())
    }

    /// Highest applied version, 0 on a fresh database.
    pub fn current_version(conn: &Connection) -> Result<u32, StorageError> {
        let tracked = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        if tracked.is_none() {
            return Ok(0);
        }

        let version: Option<u32> =
            conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
        Ok(version.unwrap_or(0))
    }
}

const SCHEMA_VERSION_TABLE: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at INTEGER NOT NULL
);
";

/// Returns all registered migrations in version order.
///
/// New migrations are appended to the end of this list.
pub fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            name: "profile_records",
            sql: MIGRATION_V1_PROFILE_RECORDS,
        },
        Migration {
            version: 2,
            name: "settings",
            sql: MIGRATION_V2_SETTINGS,
        },
    ]
}

const MIGRATION_V1_PROFILE_RECORDS: &str = "
CREATE TABLE IF NOT EXISTS profile_records (
    identity TEXT PRIMARY KEY,
    version TEXT NOT NULL,
    ciphertext TEXT NOT NULL,
    iv TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);
";

const MIGRATION_V2_SETTINGS: &str = "
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";
