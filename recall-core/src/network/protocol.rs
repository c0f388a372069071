// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Protocol Layer
//!
//! Frame cleanup and JSON encoding/decoding of [`SyncMessage`]s. One message
//! per WebSocket text frame.

use super::error::NetworkError;
use super::message::SyncMessage;
use super::transport::Frame;

/// Maximum accepted frame size (1 MiB).
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Cleans up an inbound frame before parsing.
///
/// Binary frames are decoded as (lossy) UTF-8. Byte-order marks and NUL
/// bytes are removed and anything before the first `{` or `[` is dropped.
/// Returns `None` when nothing JSON-like is left.
pub fn sanitize_frame(frame: Frame) -> Option<String> {
    let text = match frame {
        Frame::Text(text) => text,
        Frame::Binary(data) => String::from_utf8_lossy(&data).into_owned(),
    };

    let cleaned: String = text
        .chars()
        .filter(|c| *c != BYTE_ORDER_MARK && *c != '\0')
        .collect();
    let start = cleaned.find(|c: char| c == '{' || c == '[')?;
    let body = cleaned[start..].trim_end();

    if body.is_empty() {
        None
    } else {
        Some(body.to_string())
    }
}

/// Parses one JSON text into a message.
pub fn parse_message(text: &str) -> Result<SyncMessage, NetworkError> {
    if text.len() > MAX_FRAME_SIZE {
        return Err(NetworkError::FrameTooLarge(text.len()));
    }

    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| NetworkError::InvalidMessage(e.to_string()))?;
    SyncMessage::from_value(value)
}

/// Encodes a message with the canonical long field names.
pub fn encode_message(message: &SyncMessage) -> Result<String, NetworkError> {
    let text = message.to_json()?;

    if text.len() > MAX_FRAME_SIZE {
        return Err(NetworkError::FrameTooLarge(text.len()));
    }
    Ok(text)
}

/// Sanitizes and parses a frame.
///
/// `Ok(None)` means the frame was noise; `Err` means it looked like JSON
/// but was not a valid message.
pub fn decode_frame(frame: Frame) -> Result<Option<SyncMessage>, NetworkError> {
    if frame.len() > MAX_FRAME_SIZE {
        return Err(NetworkError::FrameTooLarge(frame.len()));
    }
    match sanitize_frame(frame) {
        Some(text) => parse_message(&text).map(Some),
        None => Ok(None),
    }
}
