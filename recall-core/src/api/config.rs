// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! API Configuration
//!
//! Configuration types for the relay connection and the local tiers.

use std::path::PathBuf;

use tracing::warn;

use crate::network::{
    RelayClientConfig, TransportConfig, DEFAULT_PULL_DEBOUNCE_MS, DEFAULT_RECONNECT_DELAY_MS,
    DEFAULT_RECONNECT_LIMIT,
};

/// Relay used when none (or an unusable one) is configured.
pub const DEFAULT_RELAY_ENDPOINT: &str = "ws://localhost:8080";

/// Returns `endpoint` if it is a WebSocket URL, otherwise the default relay.
pub fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("ws://") || lower.starts_with("wss://") {
        // Scheme must be lowercase for the transport's URL parsing
        let split = trimmed.find("://").map(|i| i + 3).unwrap_or(0);
        format!("{}{}", &lower[..split], &trimmed[split..])
    } else {
        if !trimmed.is_empty() {
            warn!(
                "Ignoring relay endpoint '{}' (expected ws:// or wss://), using {}",
                trimmed, DEFAULT_RELAY_ENDPOINT
            );
        }
        DEFAULT_RELAY_ENDPOINT.to_string()
    }
}

/// Relay server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Relay WebSocket URL.
    pub endpoint: String,

    /// Consecutive closes before automatic reconnects stop.
    pub reconnect_limit: u32,

    /// Delay before each automatic reconnect (milliseconds).
    pub reconnect_delay_ms: u64,

    /// Pull coalescing window (milliseconds).
    pub pull_debounce_ms: u64,

    /// Connection timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Read timeout used when polling the socket (milliseconds).
    pub io_timeout_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            endpoint: DEFAULT_RELAY_ENDPOINT.to_string(),
            reconnect_limit: DEFAULT_RECONNECT_LIMIT,
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            pull_debounce_ms: DEFAULT_PULL_DEBOUNCE_MS,
            connect_timeout_ms: 10_000,
            io_timeout_ms: 50,
        }
    }
}

impl RelayConfig {
    /// Creates a config for `endpoint`, falling back to the default relay if
    /// it is not a WebSocket URL.
    pub fn new(endpoint: &str) -> Self {
        RelayConfig {
            endpoint: normalize_endpoint(endpoint),
            ..Default::default()
        }
    }

    /// Sets the relay endpoint.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = normalize_endpoint(endpoint);
        self
    }

    /// Converts to relay client config, normalizing an endpoint that was set
    /// directly on the field.
    pub fn to_relay_client_config(&self) -> RelayClientConfig {
        RelayClientConfig {
            transport: TransportConfig {
                server_url: normalize_endpoint(&self.endpoint),
                connect_timeout_ms: self.connect_timeout_ms,
                io_timeout_ms: self.io_timeout_ms,
            },
            reconnect_limit: self.reconnect_limit,
            reconnect_delay_ms: self.reconnect_delay_ms,
            pull_debounce_ms: self.pull_debounce_ms,
        }
    }
}

/// Locations of the local tiers plus the relay settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Tier 1 SQLite database file.
    pub database_path: PathBuf,

    /// Tier 2 shared directory.
    pub fallback_dir: PathBuf,

    pub relay: RelayConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::with_data_dir("./recall_data")
    }
}

impl SyncConfig {
    /// Places both tiers under `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        SyncConfig {
            database_path: data_dir.join("profile.db"),
            fallback_dir: data_dir.join("shared"),
            relay: RelayConfig::default(),
        }
    }

    /// Uses a separate shared directory for tier 2.
    pub fn with_fallback_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fallback_dir = dir.into();
        self
    }

    pub fn with_relay(mut self, relay: RelayConfig) -> Self {
        self.relay = relay;
        self
    }
}
