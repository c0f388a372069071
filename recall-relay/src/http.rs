// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Monitoring Endpoints
//!
//! `/health` and `/ready` are always open. `/metrics` serves the Prometheus
//! text format and, when a token is configured, wants `Authorization: Bearer`.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::metrics::RelayMetrics;
use crate::snapshot::SnapshotScheduler;
use crate::store::RecordTable;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

#[derive(Clone)]
pub struct HttpState {
    pub metrics: RelayMetrics,
    pub table: Arc<RecordTable>,
    pub snapshots: Option<Arc<SnapshotScheduler>>,
    pub start_time: Instant,
    pub metrics_token: Option<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub record_count: usize,
    /// A snapshot write is armed but has not run yet.
    pub snapshot_pending: bool,
}

/// Builds the monitoring router.
pub fn create_router(state: HttpState) -> Router {
    let metrics = Router::new()
        .route("/metrics", get(metrics))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .merge(metrics)
        .with_state(state)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn require_token(State(state): State<HttpState>, request: Request, next: Next) -> Response {
    let Some(expected) = state.metrics_token.as_deref() else {
        return next.run(request).await;
    };
    if bearer_token(request.headers()) == Some(expected) {
        next.run(request).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Bearer")],
            "Unauthorized",
        )
            .into_response()
    }
}

async fn index() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ["/health", "/ready", "/metrics"]
    }))
}

async fn health(State(state): State<HttpState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

async fn ready(State(state): State<HttpState>) -> Json<ReadyResponse> {
    let snapshot_pending = state
        .snapshots
        .as_ref()
        .is_some_and(|scheduler| scheduler.is_pending());
    Json(ReadyResponse {
        ready: true,
        record_count: state.table.len(),
        snapshot_pending,
    })
}

async fn metrics(State(state): State<HttpState>) -> impl IntoResponse {
    state.metrics.records_stored.set(state.table.len() as i64);
    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        state.metrics.encode(),
    )
}
