// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Recall Relay Server
//!
//! Stores one encrypted profile envelope per identity and hands it back on
//! request.

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use recall_relay::config::RelayConfig;
use recall_relay::connection_limit::ConnectionLimiter;
use recall_relay::http::create_router;
use recall_relay::metrics::RelayMetrics;
use recall_relay::{build_state, http_state, serve, RelayError};

#[tokio::main]
async fn main() -> Result<(), RelayError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("recall_relay=info")),
        )
        .init();

    let config = RelayConfig::from_env();
    info!("Starting Recall Relay Server v{}", env!("CARGO_PKG_VERSION"));
    info!("WebSocket: {}", config.listen_addr);
    info!("HTTP (health/metrics): {}", config.http_addr());
    info!("Snapshot: {}", config.snapshot_path.display());

    let metrics = RelayMetrics::new()?;
    let state = build_state(&config, metrics);

    let http_router = create_router(http_state(&state, config.metrics_token.clone()));
    let http_addr = config.http_addr();
    let http_listener = TcpListener::bind(http_addr).await?;
    tokio::spawn(async move {
        info!("HTTP server listening on {}", http_addr);
        if let Err(e) = axum::serve(http_listener, http_router).await {
            error!("HTTP server stopped: {}", e);
        }
    });

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("WebSocket server listening on {}", config.listen_addr);
    let limiter = ConnectionLimiter::new(config.max_connections);

    tokio::select! {
        _ = serve(listener, state.clone(), limiter) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }

    // Don't lose pushes still inside the debounce window
    if let Err(e) = state.snapshots.write_now().await {
        error!("Final snapshot failed: {}", e);
    }
    Ok(())
}
