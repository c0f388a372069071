// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Transport Trait
//!
//! Platform-agnostic abstraction for the relay socket. Transports move raw
//! frames; parsing and reconnection live in the relay client.

use super::error::NetworkError;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, NetworkError>;

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never connected, or explicitly disconnected.
    Disconnected,
    /// Connection in progress.
    Connecting,
    /// Connected and ready.
    Open,
    /// Connection lost or refused.
    Closed,
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }
}

/// A frame as delivered by the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

impl Frame {
    pub fn len(&self) -> usize {
        match self {
            Frame::Text(text) => text.len(),
            Frame::Binary(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Configuration for transport connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Server URL (`ws://` or `wss://`).
    pub server_url: String,
    /// Connection timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Read timeout in milliseconds. Kept short so `receive` can be polled.
    pub io_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            server_url: String::new(),
            connect_timeout_ms: 10_000,
            io_timeout_ms: 50,
        }
    }
}

/// Transport trait for relay communication.
///
/// The interface is synchronous. `receive` must return `Ok(None)` when no
/// frame arrived within the configured read timeout.
pub trait Transport: Send {
    /// Connects to the relay server.
    fn connect(&mut self, config: &TransportConfig) -> TransportResult<()>;

    /// Disconnects from the relay server.
    ///
    /// Safe to call even if not connected.
    fn disconnect(&mut self) -> TransportResult<()>;

    /// Returns the current connection state.
    fn state(&self) -> ConnectionState;

    /// Sends one text frame.
    fn send(&mut self, frame: &str) -> TransportResult<()>;

    /// Receives the next frame, if any.
    ///
    /// Returns `Err(NetworkError::ConnectionClosed)` once the peer is gone.
    fn receive(&mut self) -> TransportResult<Option<Frame>>;

    /// Checks if there are buffered frames to receive (non-blocking).
    fn has_pending(&self) -> bool;
}
