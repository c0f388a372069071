// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Recall Relay Server
//!
//! A minimal broker for encrypted profile envelopes:
//! - WebSocket endpoint storing one payload per identity (push/pull)
//! - Debounced JSON snapshots so the table survives restarts
//! - HTTP endpoints for health checks and Prometheus metrics
//! - Connection and frame size limits

pub mod config;
pub mod connection_limit;
pub mod error;
pub mod handler;
pub mod http;
pub mod metrics;
pub mod snapshot;
pub mod store;

use std::sync::Arc;
use std::time::Instant;

use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tracing::{error, info, warn};

use config::RelayConfig;
use connection_limit::ConnectionLimiter;
use handler::RelayState;
use http::HttpState;
use metrics::RelayMetrics;
use snapshot::{load_snapshot, SnapshotScheduler};
use store::RecordTable;

pub use error::RelayError;

/// Builds the shared state, loading the snapshot named in `config`.
pub fn build_state(config: &RelayConfig, metrics: RelayMetrics) -> Arc<RelayState> {
    let table = Arc::new(RecordTable::from_records(load_snapshot(
        &config.snapshot_path,
    )));
    metrics.records_stored.set(table.len() as i64);

    let snapshots = SnapshotScheduler::new(
        config.snapshot_path.clone(),
        config.snapshot_debounce(),
        Arc::clone(&table),
        metrics.clone(),
    );

    Arc::new(RelayState {
        table,
        snapshots,
        metrics,
        max_message_size: config.max_message_size,
    })
}

/// HTTP state sharing the relay's table and metrics.
pub fn http_state(state: &RelayState, metrics_token: Option<String>) -> HttpState {
    HttpState {
        metrics: state.metrics.clone(),
        table: Arc::clone(&state.table),
        snapshots: Some(Arc::clone(&state.snapshots)),
        start_time: Instant::now(),
        metrics_token,
    }
}

/// Accepts WebSocket connections on `listener` until it fails.
pub async fn serve(listener: TcpListener, state: Arc<RelayState>, limiter: ConnectionLimiter) {
    while let Ok((stream, addr)) = listener.accept().await {
        let Some(guard) = limiter.try_acquire() else {
            warn!(
                "Connection rejected from {}: at max capacity ({}/{})",
                addr,
                limiter.active_count(),
                limiter.max()
            );
            state.metrics.connection_errors.inc();
            drop(stream);
            continue;
        };

        let state = Arc::clone(&state);
        tokio::spawn(async move {
            let _guard = guard;

            match accept_async(stream).await {
                Ok(ws_stream) => {
                    info!("New connection from {}", addr);
                    state.metrics.connections_total.inc();
                    state.metrics.connections_active.inc();

                    handler::handle_connection(ws_stream, Arc::clone(&state)).await;

                    state.metrics.connections_active.dec();
                    info!("Connection closed: {}", addr);
                }
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    state.metrics.connection_errors.inc();
                }
            }
        });
    }
}

/// Binds an ephemeral local port and serves on it (for tests).
pub async fn spawn_local(
    state: Arc<RelayState>,
    max_connections: usize,
) -> Result<std::net::SocketAddr, RelayError> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(serve(listener, state, ConnectionLimiter::new(max_connections)));
    Ok(addr)
}
