// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Relay Configuration
//!
//! Read from `RECALL_RELAY_*` environment variables. Unset or unparseable
//! values fall back to the defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_HTTP_PORT: u16 = 8081;
pub const DEFAULT_SNAPSHOT_PATH: &str = "./data/relay-snapshot.json";
pub const DEFAULT_SNAPSHOT_DEBOUNCE_MS: u64 = 250;
pub const DEFAULT_MAX_CONNECTIONS: usize = 1000;
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Relay server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// WebSocket listen address.
    pub listen_addr: SocketAddr,
    /// Port for health and metrics, on the same host.
    pub http_port: u16,
    pub snapshot_path: PathBuf,
    pub snapshot_debounce_ms: u64,
    pub max_connections: usize,
    /// Frames larger than this are ignored.
    pub max_message_size: usize,
    /// Bearer token required on `/metrics`, if set.
    pub metrics_token: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            http_port: DEFAULT_HTTP_PORT,
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            snapshot_debounce_ms: DEFAULT_SNAPSHOT_DEBOUNCE_MS,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            metrics_token: None,
        }
    }
}

impl RelayConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        RelayConfig {
            listen_addr: parse_or(&lookup, "RECALL_RELAY_LISTEN", defaults.listen_addr),
            http_port: parse_or(&lookup, "RECALL_RELAY_HTTP_PORT", defaults.http_port),
            snapshot_path: lookup("RECALL_RELAY_SNAPSHOT")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.snapshot_path),
            snapshot_debounce_ms: parse_or(
                &lookup,
                "RECALL_RELAY_SNAPSHOT_DEBOUNCE_MS",
                defaults.snapshot_debounce_ms,
            ),
            max_connections: parse_or(
                &lookup,
                "RECALL_RELAY_MAX_CONNECTIONS",
                defaults.max_connections,
            ),
            max_message_size: parse_or(
                &lookup,
                "RECALL_RELAY_MAX_MESSAGE_SIZE",
                defaults.max_message_size,
            ),
            metrics_token: lookup("RECALL_RELAY_METRICS_TOKEN").filter(|s| !s.is_empty()),
        }
    }

    pub fn snapshot_debounce(&self) -> Duration {
        Duration::from_millis(self.snapshot_debounce_ms)
    }

    /// Address of the health/metrics listener.
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_addr.ip(), self.http_port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring invalid {}={:?}, using default", key, raw);
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RelayConfig::from_lookup(|_| None);
        assert_eq!(config, RelayConfig::default());
        assert_eq!(config.listen_addr.to_string(), DEFAULT_LISTEN_ADDR);
        assert_eq!(config.http_addr().port(), 8081);
        assert_eq!(config.snapshot_debounce(), Duration::from_millis(250));
    }

    #[test]
    fn test_overrides() {
        let config = RelayConfig::from_lookup(lookup_from(&[
            ("RECALL_RELAY_LISTEN", "127.0.0.1:9000"),
            ("RECALL_RELAY_HTTP_PORT", "9001"),
            ("RECALL_RELAY_SNAPSHOT", "/var/lib/recall/snap.json"),
            ("RECALL_RELAY_SNAPSHOT_DEBOUNCE_MS", "10"),
            ("RECALL_RELAY_MAX_CONNECTIONS", "2"),
            ("RECALL_RELAY_METRICS_TOKEN", "secret"),
        ]));

        assert_eq!(config.http_addr().to_string(), "127.0.0.1:9001");
        assert_eq!(config.snapshot_path, PathBuf::from("/var/lib/recall/snap.json"));
        assert_eq!(config.snapshot_debounce_ms, 10);
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.metrics_token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = RelayConfig::from_lookup(lookup_from(&[
            ("RECALL_RELAY_LISTEN", "not an address"),
            ("RECALL_RELAY_MAX_MESSAGE_SIZE", "-5"),
            ("RECALL_RELAY_SNAPSHOT", "  "),
        ]));
        assert_eq!(config, RelayConfig::default());
    }
}
