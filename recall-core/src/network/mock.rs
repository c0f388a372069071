// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mock Transport
//!
//! Mock implementation of the Transport trait for testing.

use std::collections::VecDeque;

use super::error::NetworkError;
use super::message::SyncMessage;
use super::protocol::parse_message;
use super::transport::{ConnectionState, Frame, Transport, TransportConfig, TransportResult};

/// Produces inbound frames in reaction to an outbound frame.
pub type Responder = Box<dyn FnMut(&str) -> Vec<Frame> + Send>;

/// Mock transport for testing.
///
/// Records outbound frames, replays queued inbound frames and can be
/// scripted to refuse connections or drop the link.
///
/// # Example
///
/// ```ignore
/// use recall_core::network::{MockTransport, TransportConfig, Transport};
///
/// let mut transport = MockTransport::new();
/// transport.connect(&TransportConfig::default()).unwrap();
/// transport.queue_text(r#"{"type":"push-ack","userId":"abc"}"#);
/// transport.send(r#"{"type":"pull","userId":"abc"}"#).unwrap();
/// assert_eq!(transport.sent_frames().len(), 1);
/// ```
pub struct MockTransport {
    state: ConnectionState,
    /// Frames that have been sent.
    sent_frames: Vec<String>,
    /// Frames to return on receive().
    receive_queue: VecDeque<Frame>,
    /// Error to inject on next operation.
    inject_error: Option<NetworkError>,
    /// Refuse every connection attempt while set.
    refuse_connections: bool,
    /// Refuse this many upcoming connection attempts.
    scripted_failures: u32,
    /// Report a remote close on the next receive().
    close_pending: bool,
    connect_attempts: u32,
    responder: Option<Responder>,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("state", &self.state)
            .field("sent_frames", &self.sent_frames.len())
            .field("receive_queue", &self.receive_queue.len())
            .field("connect_attempts", &self.connect_attempts)
            .field("responder", &self.responder.is_some())
            .finish()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        MockTransport {
            state: ConnectionState::Disconnected,
            sent_frames: Vec::new(),
            receive_queue: VecDeque::new(),
            inject_error: None,
            refuse_connections: false,
            scripted_failures: 0,
            close_pending: false,
            connect_attempts: 0,
            responder: None,
        }
    }

    /// Creates a mock whose sent frames are answered by `responder`.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: FnMut(&str) -> Vec<Frame> + Send + 'static,
    {
        let mut transport = Self::new();
        transport.responder = Some(Box::new(responder));
        transport
    }

    /// Queues a frame to be returned by a later receive() call.
    pub fn queue_receive(&mut self, frame: Frame) {
        self.receive_queue.push_back(frame);
    }

    /// Queues a text frame.
    pub fn queue_text(&mut self, text: &str) {
        self.receive_queue.push_back(Frame::Text(text.to_string()));
    }

    /// Returns all frames that have been sent.
    pub fn sent_frames(&self) -> &[String] {
        &self.sent_frames
    }

    /// Sent frames parsed back into messages (unparseable ones skipped).
    pub fn sent_messages(&self) -> Vec<SyncMessage> {
        self.sent_frames
            .iter()
            .filter_map(|f| parse_message(f).ok())
            .collect()
    }

    /// Injects an error to be returned on the next operation.
    pub fn inject_error(&mut self, error: NetworkError) {
        self.inject_error = Some(error);
    }

    /// Refuses (or accepts again) all connection attempts.
    pub fn set_refuse_connections(&mut self, refuse: bool) {
        self.refuse_connections = refuse;
    }

    /// Refuses the next `count` connection attempts.
    pub fn fail_next_connects(&mut self, count: u32) {
        self.scripted_failures = count;
    }

    /// Simulates the peer closing the socket.
    pub fn close_remote(&mut self) {
        self.close_pending = true;
    }

    /// Number of connect() calls so far.
    pub fn connect_attempts(&self) -> u32 {
        self.connect_attempts
    }

    fn check_error(&mut self) -> TransportResult<()> {
        if let Some(err) = self.inject_error.take() {
            return Err(err);
        }
        Ok(())
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, _config: &TransportConfig) -> TransportResult<()> {
        self.connect_attempts += 1;
        self.check_error()?;

        if self.refuse_connections || self.scripted_failures > 0 {
            self.scripted_failures = self.scripted_failures.saturating_sub(1);
            self.state = ConnectionState::Closed;
            return Err(NetworkError::ConnectionFailed("connection refused".into()));
        }

        self.close_pending = false;
        self.state = ConnectionState::Open;
        Ok(())
    }

    fn disconnect(&mut self) -> TransportResult<()> {
        self.state = ConnectionState::Disconnected;
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn send(&mut self, frame: &str) -> TransportResult<()> {
        self.check_error()?;

        if self.state != ConnectionState::Open {
            return Err(NetworkError::NotConnected);
        }

        self.sent_frames.push(frame.to_string());

        if let Some(responder) = self.responder.as_mut() {
            let replies = responder(frame);
            self.receive_queue.extend(replies);
        }

        Ok(())
    }

    fn receive(&mut self) -> TransportResult<Option<Frame>> {
        self.check_error()?;

        if self.close_pending {
            self.close_pending = false;
            self.state = ConnectionState::Closed;
            return Err(NetworkError::ConnectionClosed);
        }

        if self.state != ConnectionState::Open {
            return Err(NetworkError::NotConnected);
        }

        Ok(self.receive_queue.pop_front())
    }

    fn has_pending(&self) -> bool {
        !self.receive_queue.is_empty()
    }
}
