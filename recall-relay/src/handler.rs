// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! WebSocket Connection Handler
//!
//! Handles individual client connections. Every inbound frame is answered
//! independently; nothing a client sends can close its connection except a
//! close frame or a socket error.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use futures_util::{SinkExt, StreamExt};
use recall_core::network::{decode_frame, encode_message, Frame, SyncMessage};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, warn};

use crate::metrics::RelayMetrics;
use crate::snapshot::SnapshotScheduler;
use crate::store::{RecordTable, StoredRecord};

/// State shared by all connections.
pub struct RelayState {
    pub table: Arc<RecordTable>,
    pub snapshots: Arc<SnapshotScheduler>,
    pub metrics: RelayMetrics,
    pub max_message_size: usize,
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn short(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Applies one message to the table and returns the reply, if any.
pub fn handle_message(state: &RelayState, message: SyncMessage) -> Option<SyncMessage> {
    match message {
        SyncMessage::Push {
            identity,
            payload,
            timestamp,
        } => {
            let record = StoredRecord {
                data: payload,
                timestamp: timestamp.unwrap_or_else(now_ms),
            };
            state.table.upsert(&identity, record);
            state.metrics.pushes_total.inc();
            state.snapshots.schedule();
            debug!("Stored push for {}", short(&identity));
            Some(SyncMessage::PushAck { identity })
        }
        SyncMessage::Pull { identity } => {
            state.metrics.pulls_total.inc();
            let stored = state.table.get(&identity);
            debug!(
                "Pull for {} ({})",
                short(&identity),
                if stored.is_some() { "hit" } else { "miss" }
            );
            Some(SyncMessage::PullResponse {
                identity,
                timestamp: stored.as_ref().map(|r| r.timestamp),
                payload: stored.map(|r| r.data),
            })
        }
        SyncMessage::PushAck { .. } | SyncMessage::PullResponse { .. } => {
            // Only the relay sends these
            state.metrics.frames_ignored.inc();
            None
        }
    }
}

/// Decodes one inbound frame and returns the encoded reply, if any.
pub fn handle_frame(state: &RelayState, frame: Frame) -> Option<String> {
    if frame.len() > state.max_message_size {
        warn!("Ignoring oversized frame ({} bytes)", frame.len());
        state.metrics.frames_ignored.inc();
        return None;
    }

    let message = match decode_frame(frame) {
        Ok(Some(message)) => message,
        Ok(None) => {
            debug!("Ignoring non-JSON frame");
            state.metrics.frames_ignored.inc();
            return None;
        }
        Err(e) => {
            debug!("Ignoring malformed frame: {}", e);
            state.metrics.frames_ignored.inc();
            return None;
        }
    };

    let reply = handle_message(state, message)?;
    match encode_message(&reply) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!("Failed to encode reply: {}", e);
            None
        }
    }
}

/// Handles a WebSocket connection until it closes.
pub async fn handle_connection<S>(ws_stream: WebSocketStream<S>, state: Arc<RelayState>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut write, mut read) = ws_stream.split();

    while let Some(msg) = read.next().await {
        let frame = match msg {
            Ok(Message::Text(text)) => Frame::Text(text),
            Ok(Message::Binary(data)) => Frame::Binary(data),
            Ok(Message::Ping(data)) => {
                let _ = write.send(Message::Pong(data)).await;
                continue;
            }
            Ok(Message::Close(_)) => {
                debug!("Client sent close");
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!("Connection error: {}", e);
                break;
            }
        };

        if let Some(reply) = handle_frame(&state, frame) {
            if let Err(e) = write.send(Message::Text(reply)).await {
                warn!("Failed to send reply: {}", e);
                break;
            }
        }
    }
}
