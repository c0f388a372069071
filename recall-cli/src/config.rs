// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI Configuration

use std::path::PathBuf;
use std::time::Duration;

use recall_core::{RelayConfig, SyncConfig};

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Data directory for tier 1.
    pub data_dir: PathBuf,
    /// Shared directory for tier 2. Defaults to `<data_dir>/shared`.
    pub shared_dir: Option<PathBuf>,
    /// Relay server URL.
    pub relay_url: String,
    /// How long commands keep talking to the relay.
    pub wait: Duration,
}

impl CliConfig {
    /// Default data directory: the platform data dir, or `./.recall`.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("recall"))
            .unwrap_or_else(|| PathBuf::from(".recall"))
    }

    /// Returns the tier 1 database path.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("profile.db")
    }

    /// Returns true if tier 1 has been created.
    pub fn is_initialized(&self) -> bool {
        self.database_path().exists()
    }

    /// Engine configuration for these settings.
    pub fn sync_config(&self) -> SyncConfig {
        let mut config = SyncConfig::with_data_dir(&self.data_dir)
            .with_relay(RelayConfig::new(&self.relay_url));
        if let Some(shared) = &self.shared_dir {
            config = config.with_fallback_dir(shared);
        }
        config
    }
}

// INLINE_TEST_REQUIRED: Binary crate without lib.rs - tests cannot be external
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(data_dir: PathBuf) -> CliConfig {
        CliConfig {
            data_dir,
            shared_dir: None,
            relay_url: "ws://127.0.0.1:9999".to_string(),
            wait: Duration::from_millis(0),
        }
    }

    #[test]
    fn test_tiers_live_under_data_dir() {
        let config = config(PathBuf::from("/tmp/recall-test"));
        let sync = config.sync_config();

        assert_eq!(sync.database_path, PathBuf::from("/tmp/recall-test/profile.db"));
        assert_eq!(sync.fallback_dir, PathBuf::from("/tmp/recall-test/shared"));
        assert_eq!(sync.relay.endpoint, "ws://127.0.0.1:9999");
    }

    #[test]
    fn test_shared_dir_overrides_fallback() {
        let mut config = config(PathBuf::from("/tmp/recall-test"));
        config.shared_dir = Some(PathBuf::from("/srv/shared"));

        assert_eq!(config.sync_config().fallback_dir, PathBuf::from("/srv/shared"));
    }

    #[test]
    fn test_unusable_relay_url_falls_back() {
        let mut config = config(PathBuf::from("/tmp/recall-test"));
        config.relay_url = "http://example.com".to_string();

        assert_eq!(
            config.sync_config().relay.endpoint,
            recall_core::DEFAULT_RELAY_ENDPOINT
        );
    }

    #[test]
    fn test_not_initialized_until_database_exists() {
        let temp_dir = tempdir().unwrap();
        let config = config(temp_dir.path().to_path_buf());
        assert!(!config.is_initialized());

        std::fs::write(config.database_path(), b"").unwrap();
        assert!(config.is_initialized());
    }
}
