// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for the relay broker contract, over real WebSocket connections

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use recall_core::network::{encode_message, parse_message, Frame, SyncMessage};
use recall_relay::config::RelayConfig;
use recall_relay::handler::{handle_frame, handle_message, RelayState};
use recall_relay::metrics::RelayMetrics;
use recall_relay::{build_state, spawn_local};
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn test_state(dir: &TempDir) -> Arc<RelayState> {
    let config = RelayConfig {
        snapshot_path: dir.path().join("snapshot.json"),
        snapshot_debounce_ms: 20,
        max_message_size: 4096,
        ..RelayConfig::default()
    };
    build_state(&config, RelayMetrics::new().unwrap())
}

async fn connect(addr: std::net::SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
    ws
}

async fn send(ws: &mut Client, message: &SyncMessage) {
    ws.send(Message::Text(encode_message(message).unwrap()))
        .await
        .unwrap();
}

/// Next protocol message, skipping control frames.
async fn recv(ws: &mut Client) -> SyncMessage {
    loop {
        let next = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("relay did not answer")
            .expect("connection closed")
            .unwrap();
        if let Message::Text(text) = next {
            return parse_message(&text).unwrap();
        }
    }
}

// ============================================================
// Message handling
// ============================================================

#[tokio::test]
async fn test_push_then_pull_returns_data_and_timestamp() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir);

    let ack = handle_message(&state, SyncMessage::push("x", "d1", Some(100)));
    assert_eq!(
        ack,
        Some(SyncMessage::PushAck {
            identity: "x".into()
        })
    );

    let reply = handle_message(&state, SyncMessage::pull("x"));
    assert_eq!(
        reply,
        Some(SyncMessage::PullResponse {
            identity: "x".into(),
            payload: Some("d1".into()),
            timestamp: Some(100),
        })
    );
}

#[tokio::test]
async fn test_pull_unknown_identity_returns_null() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir);

    let reply = handle_frame(&state, Frame::Text(r#"{"type":"pull","u":"nobody"}"#.into()))
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(value["type"], "pull-response");
    assert_eq!(value["userId"], "nobody");
    assert!(value["data"].is_null());
}

#[tokio::test]
async fn test_push_without_timestamp_uses_arrival_time() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir);

    handle_message(&state, SyncMessage::push("x", "d1", None));
    let stored = state.table.get("x").unwrap();
    assert!(stored.timestamp > 1_600_000_000_000);
}

#[tokio::test]
async fn test_latest_push_wins_regardless_of_timestamp() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir);

    handle_message(&state, SyncMessage::push("x", "newer", Some(200)));
    handle_message(&state, SyncMessage::push("x", "older", Some(100)));
    assert_eq!(state.table.get("x").unwrap().data, "older");
}

#[tokio::test]
async fn test_client_sent_replies_are_ignored() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir);

    assert_eq!(
        handle_message(&state, SyncMessage::PushAck { identity: "x".into() }),
        None
    );
    assert_eq!(
        handle_message(
            &state,
            SyncMessage::PullResponse {
                identity: "x".into(),
                payload: Some("forged".into()),
                timestamp: Some(1),
            }
        ),
        None
    );
    assert!(state.table.is_empty());
}

#[tokio::test]
async fn test_noise_and_oversized_frames_ignored() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir);

    let oversized = format!(
        r#"{{"type":"push","userId":"x","data":"{}"}}"#,
        "a".repeat(5000)
    );
    for frame in [
        Frame::Text("hello".into()),
        Frame::Text("{broken".into()),
        Frame::Text("[1,2,3]".into()),
        Frame::Binary(vec![0, 159, 146, 150]),
        Frame::Text(oversized),
    ] {
        assert_eq!(handle_frame(&state, frame), None);
    }
    assert!(state.table.is_empty());
    assert_eq!(state.metrics.frames_ignored.get(), 5);
}

// ============================================================
// Over the wire
// ============================================================

#[tokio::test]
async fn test_broker_contract_over_websocket() {
    let dir = TempDir::new().unwrap();
    let addr = spawn_local(test_state(&dir), 16).await.unwrap();
    let mut ws = connect(addr).await;

    send(&mut ws, &SyncMessage::push("x", "d1", Some(100))).await;
    assert_eq!(
        recv(&mut ws).await,
        SyncMessage::PushAck {
            identity: "x".into()
        }
    );

    send(&mut ws, &SyncMessage::pull("x")).await;
    assert_eq!(
        recv(&mut ws).await,
        SyncMessage::PullResponse {
            identity: "x".into(),
            payload: Some("d1".into()),
            timestamp: Some(100),
        }
    );
}

#[tokio::test]
async fn test_data_is_shared_between_connections() {
    let dir = TempDir::new().unwrap();
    let addr = spawn_local(test_state(&dir), 16).await.unwrap();

    let mut writer = connect(addr).await;
    send(&mut writer, &SyncMessage::push("x", "shared", Some(5))).await;
    recv(&mut writer).await;

    let mut reader = connect(addr).await;
    send(&mut reader, &SyncMessage::pull("x")).await;
    match recv(&mut reader).await {
        SyncMessage::PullResponse { payload, .. } => assert_eq!(payload.as_deref(), Some("shared")),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_garbage_does_not_close_connection() {
    let dir = TempDir::new().unwrap();
    let addr = spawn_local(test_state(&dir), 16).await.unwrap();
    let mut ws = connect(addr).await;

    ws.send(Message::Text("garbage".into())).await.unwrap();
    ws.send(Message::Binary(vec![0xff, 0x00, 0x13])).await.unwrap();
    ws.send(Message::Text(r#"{"type":"push-ack","userId":"x"}"#.into()))
        .await
        .unwrap();
    send(&mut ws, &SyncMessage::pull("x")).await;

    // The pull is the first frame that gets an answer
    assert!(matches!(
        recv(&mut ws).await,
        SyncMessage::PullResponse { payload: None, .. }
    ));
}

#[tokio::test]
async fn test_short_aliases_over_the_wire() {
    let dir = TempDir::new().unwrap();
    let addr = spawn_local(test_state(&dir), 16).await.unwrap();
    let mut ws = connect(addr).await;

    ws.send(Message::Text(r#"{"type":"push","u":"x","d":"short","t":9}"#.into()))
        .await
        .unwrap();
    recv(&mut ws).await;
    ws.send(Message::Text(r#"{"type":"pull","u":"x"}"#.into()))
        .await
        .unwrap();

    assert_eq!(
        recv(&mut ws).await,
        SyncMessage::PullResponse {
            identity: "x".into(),
            payload: Some("short".into()),
            timestamp: Some(9),
        }
    );
}

#[tokio::test]
async fn test_ping_is_answered() {
    let dir = TempDir::new().unwrap();
    let addr = spawn_local(test_state(&dir), 16).await.unwrap();
    let mut ws = connect(addr).await;

    ws.send(Message::Ping(b"hi".to_vec())).await.unwrap();
    let reply = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(reply, Message::Pong(b"hi".to_vec()));
}

#[tokio::test]
async fn test_connections_beyond_limit_are_refused() {
    let dir = TempDir::new().unwrap();
    let addr = spawn_local(test_state(&dir), 1).await.unwrap();

    let mut first = connect(addr).await;
    assert!(connect_async(format!("ws://{}", addr)).await.is_err());

    // The first connection keeps working
    send(&mut first, &SyncMessage::pull("x")).await;
    assert!(matches!(recv(&mut first).await, SyncMessage::PullResponse { .. }));
}
