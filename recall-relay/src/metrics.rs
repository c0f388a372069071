// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Prometheus Metrics
//!
//! Counters exposed on the `/metrics` endpoint.

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

/// Relay metrics. Clones share the same underlying counters.
#[derive(Clone)]
pub struct RelayMetrics {
    registry: Registry,
    pub connections_total: IntCounter,
    pub connections_active: IntGauge,
    pub connection_errors: IntCounter,
    pub pushes_total: IntCounter,
    pub pulls_total: IntCounter,
    pub frames_ignored: IntCounter,
    pub snapshot_writes: IntCounter,
    pub records_stored: IntGauge,
}

impl RelayMetrics {
    /// Creates a fresh set of metrics in a private registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let counter = |name: &str, help: &str| -> Result<IntCounter, prometheus::Error> {
            let c = IntCounter::new(name, help)?;
            registry.register(Box::new(c.clone()))?;
            Ok(c)
        };
        let gauge = |name: &str, help: &str| -> Result<IntGauge, prometheus::Error> {
            let g = IntGauge::new(name, help)?;
            registry.register(Box::new(g.clone()))?;
            Ok(g)
        };

        Ok(RelayMetrics {
            connections_total: counter(
                "recall_relay_connections_total",
                "Total WebSocket connections accepted",
            )?,
            connections_active: gauge(
                "recall_relay_connections_active",
                "Currently open WebSocket connections",
            )?,
            connection_errors: counter(
                "recall_relay_connection_errors_total",
                "Rejected connections and failed handshakes",
            )?,
            pushes_total: counter("recall_relay_pushes_total", "Push messages stored")?,
            pulls_total: counter("recall_relay_pulls_total", "Pull messages answered")?,
            frames_ignored: counter(
                "recall_relay_frames_ignored_total",
                "Inbound frames dropped as noise, oversized or unexpected",
            )?,
            snapshot_writes: counter(
                "recall_relay_snapshot_writes_total",
                "Snapshot files written",
            )?,
            records_stored: gauge("recall_relay_records_stored", "Records in the table")?,
            registry,
        })
    }

    /// Encodes all metrics in the Prometheus text format.
    pub fn encode(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!("Failed to encode metrics: {}", e);
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}
