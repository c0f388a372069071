// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync Message Types
//!
//! The wire unit shared by clients and the relay. Payloads are opaque
//! strings here; nothing in this module looks inside an envelope.
//!
//! Two field-naming conventions exist in the wild (`userId`/`data`/`timestamp`
//! and `u`/`d`/`t`). Both are folded into one shape when parsing; encoding
//! always writes the long names.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::NetworkError;

/// Message kind, as written in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    Push,
    Pull,
    PushAck,
    PullResponse,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Push => "push",
            MessageKind::Pull => "pull",
            MessageKind::PushAck => "push-ack",
            MessageKind::PullResponse => "pull-response",
        }
    }
}

/// Inbound wire shape.
///
/// Long and short names are separate fields rather than serde aliases:
/// senders may write both spellings in one object, and a null long field
/// must fall back to the short one.
#[derive(Deserialize)]
struct RawMessage {
    #[serde(rename = "type")]
    kind: MessageKind,
    #[serde(rename = "userId", default)]
    user_id: Option<String>,
    #[serde(default)]
    u: Option<String>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    d: Option<Value>,
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default)]
    t: Option<Value>,
}

/// Outbound wire shape; always the long names.
#[derive(Serialize)]
struct WireMessage<'a> {
    #[serde(rename = "type")]
    kind: MessageKind,
    #[serde(rename = "userId")]
    user_id: &'a str,
    /// `Some(None)` writes an explicit null.
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Option<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<i64>,
}
/// A relay protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncMessage {
    /// Store `payload` under `identity`.
    Push {
        identity: String,
        payload: String,
        timestamp: Option<i64>,
    },
    /// Ask for the payload stored under `identity`.
    Pull { identity: String },
    /// The relay accepted a push.
    PushAck { identity: String },
    /// Answer to a pull; `payload` is `None` when nothing is stored.
    PullResponse {
        identity: String,
        payload: Option<String>,
        timestamp: Option<i64>,
    },
}

impl SyncMessage {
    pub fn push(identity: impl Into<String>, payload: impl Into<String>, timestamp: Option<i64>) -> Self {
        SyncMessage::Push {
            identity: identity.into(),
            payload: payload.into(),
            timestamp,
        }
    }

    pub fn pull(identity: impl Into<String>) -> Self {
        SyncMessage::Pull {
            identity: identity.into(),
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            SyncMessage::Push { .. } => MessageKind::Push,
            SyncMessage::Pull { .. } => MessageKind::Pull,
            SyncMessage::PushAck { .. } => MessageKind::PushAck,
            SyncMessage::PullResponse { .. } => MessageKind::PullResponse,
        }
    }

    pub fn identity(&self) -> &str {
        match self {
            SyncMessage::Push { identity, .. }
            | SyncMessage::Pull { identity }
            | SyncMessage::PushAck { identity }
            | SyncMessage::PullResponse { identity, .. } => identity,
        }
    }

    pub fn is_push(&self) -> bool {
        matches!(self, SyncMessage::Push { .. })
    }

    /// Normalizes a decoded JSON value into a message.
    pub fn from_value(value: Value) -> Result<Self, NetworkError> {
        if !value.is_object() {
            return Err(NetworkError::InvalidMessage("expected a JSON object".into()));
        }
        let raw = RawMessage::deserialize(value)
            .map_err(|e| NetworkError::InvalidMessage(e.to_string()))?;

        let identity = raw
            .user_id
            .or(raw.u)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| NetworkError::InvalidMessage("missing userId".into()))?;
        let data = raw.data.or(raw.d).map(payload_text).transpose()?;
        let timestamp = raw.timestamp.or(raw.t).and_then(|t| as_millis(&t));

        Ok(match raw.kind {
            MessageKind::Push => SyncMessage::Push {
                identity,
                payload: data
                    .ok_or_else(|| NetworkError::InvalidMessage("push without data".into()))?,
                timestamp,
            },
            MessageKind::Pull => SyncMessage::Pull { identity },
            MessageKind::PushAck => SyncMessage::PushAck { identity },
            MessageKind::PullResponse => SyncMessage::PullResponse {
                identity,
                payload: data,
                timestamp,
            },
        })
    }

    /// Encodes the canonical JSON text with long field names.
    pub fn to_json(&self) -> Result<String, NetworkError> {
        let (data, timestamp) = match self {
            SyncMessage::Push {
                payload, timestamp, ..
            } => (Some(Some(payload.as_str())), *timestamp),
            SyncMessage::PullResponse {
                payload, timestamp, ..
            } => (Some(payload.as_deref()), *timestamp),
            SyncMessage::Pull { .. } | SyncMessage::PushAck { .. } => (None, None),
        };
        let wire = WireMessage {
            kind: self.kind(),
            user_id: self.identity(),
            data,
            timestamp,
        };
        serde_json::to_string(&wire).map_err(|e| NetworkError::Serialization(e.to_string()))
    }
}

/// Payloads are strings; a structured payload is kept as its JSON text.
fn payload_text(value: Value) -> Result<String, NetworkError> {
    match value {
        Value::String(s) => Ok(s),
        other => serde_json::to_string(&other).map_err(|e| NetworkError::Serialization(e.to_string())),
    }
}

fn as_millis(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
}
