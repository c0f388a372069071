// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for debounced snapshots and startup loading

use std::time::Duration;

use recall_core::network::SyncMessage;
use recall_relay::build_state;
use recall_relay::config::RelayConfig;
use recall_relay::handler::handle_message;
use recall_relay::metrics::RelayMetrics;
use recall_relay::snapshot::load_snapshot;
use tempfile::TempDir;

fn config_in(dir: &TempDir, debounce_ms: u64) -> RelayConfig {
    RelayConfig {
        snapshot_path: dir.path().join("data").join("snapshot.json"),
        snapshot_debounce_ms: debounce_ms,
        ..RelayConfig::default()
    }
}

#[tokio::test]
async fn test_burst_of_pushes_writes_once() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, 100);
    let state = build_state(&config, RelayMetrics::new().unwrap());

    for i in 0..20 {
        handle_message(&state, SyncMessage::push(format!("id-{}", i), "payload", Some(i)));
    }
    assert!(state.snapshots.is_pending());
    assert_eq!(state.snapshots.writes(), 0);

    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(state.snapshots.writes(), 1);
    assert_eq!(state.metrics.snapshot_writes.get(), 1);
    assert_eq!(load_snapshot(&config.snapshot_path).len(), 20);
}

#[tokio::test]
async fn test_separate_bursts_write_separately() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, 30);
    let state = build_state(&config, RelayMetrics::new().unwrap());

    handle_message(&state, SyncMessage::push("a", "1", Some(1)));
    tokio::time::sleep(Duration::from_millis(300)).await;
    handle_message(&state, SyncMessage::push("b", "2", Some(2)));
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(state.snapshots.writes(), 2);
    assert_eq!(load_snapshot(&config.snapshot_path).len(), 2);
}

#[tokio::test]
async fn test_pulls_do_not_write() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, 10);
    let state = build_state(&config, RelayMetrics::new().unwrap());

    handle_message(&state, SyncMessage::pull("a"));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(state.snapshots.writes(), 0);
    assert!(!config.snapshot_path.exists());
}

#[tokio::test]
async fn test_restart_restores_table() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, 10);

    {
        let state = build_state(&config, RelayMetrics::new().unwrap());
        handle_message(&state, SyncMessage::push("x", "kept", Some(42)));
        state.snapshots.write_now().await.unwrap();
    }

    let state = build_state(&config, RelayMetrics::new().unwrap());
    let reply = handle_message(&state, SyncMessage::pull("x"));
    assert_eq!(
        reply,
        Some(SyncMessage::PullResponse {
            identity: "x".into(),
            payload: Some("kept".into()),
            timestamp: Some(42),
        })
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_writes_keep_newest_table() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, 60_000);
    let state = build_state(&config, RelayMetrics::new().unwrap());

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let state = state.clone();
            tokio::spawn(async move {
                handle_message(&state, SyncMessage::push(format!("id-{}", i), "payload", Some(i)));
                state.snapshots.write_now().await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(state.snapshots.writes(), 16);
    assert_eq!(load_snapshot(&config.snapshot_path).len(), 16);
    assert!(!config.snapshot_path.with_extension("json.tmp").exists());
}

#[tokio::test]
async fn test_corrupt_snapshot_starts_empty() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, 10);
    std::fs::create_dir_all(config.snapshot_path.parent().unwrap()).unwrap();
    std::fs::write(&config.snapshot_path, b"{\"x\": {\"data\": 12").unwrap();

    let state = build_state(&config, RelayMetrics::new().unwrap());
    assert!(state.table.is_empty());
}

#[test]
fn test_missing_snapshot_is_empty() {
    let dir = TempDir::new().unwrap();
    assert!(load_snapshot(&dir.path().join("nothing.json")).is_empty());
}
