// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Relay Client
//!
//! Connection state machine over a [`Transport`]:
//! `Disconnected -> Connecting -> Open -> (Closed -> Connecting)*`.
//!
//! The client owns the socket, a single-slot queue for the latest push made
//! while offline, and two timers (reconnect and debounced pull). It never
//! looks inside payloads.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::error::NetworkError;
use super::message::SyncMessage;
use super::protocol::{decode_frame, encode_message};
use super::scheduler::{Clock, TimerQueue};
use super::transport::{ConnectionState, Frame, Transport, TransportConfig};

/// Consecutive closes after which automatic reconnects stop.
pub const DEFAULT_RECONNECT_LIMIT: u32 = 5;
/// Delay before an automatic reconnect.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 3_000;
/// Window in which pull requests are coalesced.
pub const DEFAULT_PULL_DEBOUNCE_MS: u64 = 200;

/// Upper bound on frames handled per poll, so one busy socket can't starve timers.
const MAX_FRAMES_PER_POLL: usize = 64;

/// Configuration for the relay client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayClientConfig {
    /// Transport configuration.
    pub transport: TransportConfig,
    pub reconnect_limit: u32,
    pub reconnect_delay_ms: u64,
    pub pull_debounce_ms: u64,
}

impl Default for RelayClientConfig {
    fn default() -> Self {
        RelayClientConfig {
            transport: TransportConfig::default(),
            reconnect_limit: DEFAULT_RECONNECT_LIMIT,
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            pull_debounce_ms: DEFAULT_PULL_DEBOUNCE_MS,
        }
    }
}

/// Something the owner of the client needs to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// The socket opened (`true`) or closed (`false`).
    StatusChanged { online: bool },
    /// A well-formed message arrived.
    Message(SyncMessage),
    /// The debounced pull window elapsed while open; send a pull now.
    PullDue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClientTimer {
    Reconnect,
    Pull,
}

type StatusListener = Box<dyn Fn(bool) + Send>;

/// Relay client with reconnection, offline push queue and pull debouncing.
///
/// # Example
///
/// ```ignore
/// use recall_core::network::{MockTransport, RelayClient, RelayClientConfig, SystemClock};
///
/// let mut client = RelayClient::new(MockTransport::new(), RelayClientConfig::default(), Arc::new(SystemClock));
/// client.connect()?;
/// client.send(SyncMessage::pull("abc"))?;
/// for event in client.poll() { /* ... */ }
/// ```
pub struct RelayClient<T: Transport> {
    transport: T,
    config: RelayClientConfig,
    clock: Arc<dyn Clock>,
    state: ConnectionState,
    /// Consecutive closes since the last successful open.
    reconnect_attempts: u32,
    /// Latest push made while offline. Newest wins.
    pending_push: Option<SyncMessage>,
    timers: TimerQueue<ClientTimer>,
    events: VecDeque<RelayEvent>,
    status_listeners: Vec<StatusListener>,
}

impl<T: Transport> RelayClient<T> {
    /// Creates a new relay client. Nothing connects until asked to.
    pub fn new(transport: T, config: RelayClientConfig, clock: Arc<dyn Clock>) -> Self {
        RelayClient {
            transport,
            config,
            clock,
            state: ConnectionState::Disconnected,
            reconnect_attempts: 0,
            pending_push: None,
            timers: TimerQueue::new(),
            events: VecDeque::new(),
            status_listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    pub fn config(&self) -> &RelayClientConfig {
        &self.config
    }

    /// Replaces the configuration. Takes effect on the next connect.
    pub fn set_config(&mut self, config: RelayClientConfig) {
        self.config = config;
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts
    }

    /// True once automatic reconnects have given up.
    pub fn retries_exhausted(&self) -> bool {
        self.reconnect_attempts >= self.config.reconnect_limit
    }

    pub fn pending_push(&self) -> Option<&SyncMessage> {
        self.pending_push.as_ref()
    }

    pub fn has_pending_push(&self) -> bool {
        self.pending_push.is_some()
    }

    /// True while a reconnect is scheduled.
    pub fn reconnect_scheduled(&self) -> bool {
        self.timers.is_armed(&ClientTimer::Reconnect)
    }

    /// Registers a callback invoked on every open/close transition.
    pub fn on_status_change<F>(&mut self, listener: F)
    where
        F: Fn(bool) + Send + 'static,
    {
        self.status_listeners.push(Box::new(listener));
    }

    /// Connects if not already open.
    pub fn connect(&mut self) -> Result<(), NetworkError> {
        if self.state.is_open() {
            return Ok(());
        }
        self.timers.cancel(&ClientTimer::Reconnect);
        self.attempt_connect()
    }

    /// Tears down the socket and connects again with a fresh retry budget.
    pub fn reconnect(&mut self) -> Result<(), NetworkError> {
        self.close_socket();
        self.timers.cancel(&ClientTimer::Reconnect);
        self.reconnect_attempts = 0;
        self.attempt_connect()
    }

    /// Closes the connection without scheduling a reconnect.
    pub fn disconnect(&mut self) {
        self.close_socket();
        self.timers.cancel_all();
    }

    /// Sends a message, or holds it if the socket is not open.
    ///
    /// While offline only the newest push is kept; other messages are
    /// dropped and `Err(NetworkError::NotConnected)` is returned. A
    /// connection attempt is triggered unless retries are exhausted.
    /// Messages that fail to encode are rejected before anything is held.
    pub fn send(&mut self, message: SyncMessage) -> Result<(), NetworkError> {
        // A message that cannot be framed is never held
        encode_message(&message)?;

        if self.state.is_open() {
            return match self.transmit(&message) {
                Ok(()) => Ok(()),
                Err(e) => {
                    if message.is_push() && e.is_connection_loss() {
                        self.pending_push = Some(message);
                    }
                    Err(e)
                }
            };
        }

        let queued = message.is_push();
        if queued {
            debug!("Relay offline, holding push for {}", message.identity());
            self.pending_push = Some(message);
        } else {
            debug!(
                "Relay offline, dropping {} for {}",
                message.kind().as_str(),
                message.identity()
            );
        }

        if self.state != ConnectionState::Connecting && !self.retries_exhausted() {
            self.timers.cancel(&ClientTimer::Reconnect);
            // Failure is already logged and scheduled for retry
            let _ = self.attempt_connect();
        }

        if queued {
            Ok(())
        } else {
            Err(NetworkError::NotConnected)
        }
    }

    /// Sends only if open. Never touches the pending-push slot.
    pub fn send_now(&mut self, message: &SyncMessage) -> Result<(), NetworkError> {
        if !self.state.is_open() {
            return Err(NetworkError::NotConnected);
        }
        self.transmit(message)
    }

    /// Asks for a pull. Requests within the debounce window collapse into one
    /// [`RelayEvent::PullDue`].
    pub fn request_pull(&mut self) {
        let due = self.clock.now_ms() + self.config.pull_debounce_ms as i64;
        self.timers.arm(ClientTimer::Pull, due);
    }

    /// Fires due timers, drains inbound frames and returns what happened.
    pub fn poll(&mut self) -> Vec<RelayEvent> {
        let now = self.clock.now_ms();
        for timer in self.timers.pop_due(now) {
            match timer {
                ClientTimer::Reconnect => {
                    debug!(
                        "Reconnecting to relay (attempt {})",
                        self.reconnect_attempts + 1
                    );
                    let _ = self.attempt_connect();
                }
                ClientTimer::Pull => {
                    if self.state.is_open() {
                        self.events.push_back(RelayEvent::PullDue);
                    }
                }
            }
        }

        if self.state.is_open() {
            self.drain_inbound();
        }

        self.events.drain(..).collect()
    }

    /// Returns a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns a mutable reference to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn attempt_connect(&mut self) -> Result<(), NetworkError> {
        self.state = ConnectionState::Connecting;
        let config = self.config.transport.clone();

        match self.transport.connect(&config) {
            Ok(()) => {
                info!("Connected to relay {}", config.server_url);
                self.handle_open();
                Ok(())
            }
            Err(e) => {
                warn!("Relay connection to {} failed: {}", config.server_url, e);
                self.handle_closed();
                Err(e)
            }
        }
    }

    fn handle_open(&mut self) {
        self.state = ConnectionState::Open;
        self.reconnect_attempts = 0;
        self.timers.cancel(&ClientTimer::Reconnect);
        self.emit_status(true);

        if let Some(push) = self.pending_push.take() {
            debug!("Flushing held push for {}", push.identity());
            if let Err(e) = self.transmit(&push) {
                if e.is_connection_loss() {
                    warn!("Failed to flush held push: {}", e);
                    if self.pending_push.is_none() {
                        self.pending_push = Some(push);
                    }
                } else {
                    warn!("Dropping held push for {}: {}", push.identity(), e);
                }
            }
        }

        if self.state.is_open() {
            self.request_pull();
        }
    }

    fn handle_closed(&mut self) {
        let _ = self.transport.disconnect();
        self.state = ConnectionState::Closed;
        self.timers.cancel(&ClientTimer::Pull);
        self.emit_status(false);

        self.reconnect_attempts += 1;
        if self.reconnect_attempts < self.config.reconnect_limit {
            let due = self.clock.now_ms() + self.config.reconnect_delay_ms as i64;
            self.timers.arm(ClientTimer::Reconnect, due);
        } else {
            warn!(
                "Relay unreachable after {} attempts, waiting for manual reconnect",
                self.reconnect_attempts
            );
        }
    }

    fn close_socket(&mut self) {
        let was_open = self.state.is_open();
        let _ = self.transport.disconnect();
        self.state = ConnectionState::Disconnected;
        if was_open {
            self.emit_status(false);
        }
    }

    fn transmit(&mut self, message: &SyncMessage) -> Result<(), NetworkError> {
        let frame = encode_message(message)?;
        match self.transport.send(&frame) {
            Ok(()) => Ok(()),
            Err(e) => {
                if e.is_connection_loss() {
                    info!("Relay connection lost while sending: {}", e);
                    self.handle_closed();
                }
                Err(e)
            }
        }
    }

    fn drain_inbound(&mut self) {
        for _ in 0..MAX_FRAMES_PER_POLL {
            match self.transport.receive() {
                Ok(Some(frame)) => self.ingest(frame),
                Ok(None) => break,
                Err(e) => {
                    info!("Relay connection lost: {}", e);
                    self.handle_closed();
                    break;
                }
            }
        }
    }

    fn ingest(&mut self, frame: Frame) {
        match decode_frame(frame) {
            Ok(Some(message)) => self.events.push_back(RelayEvent::Message(message)),
            Ok(None) => debug!("Dropping non-JSON frame from relay"),
            Err(e) => warn!("Dropping malformed relay frame: {}", e),
        }
    }

    fn emit_status(&mut self, online: bool) {
        for listener in &self.status_listeners {
            listener(online);
        }
        self.events.push_back(RelayEvent::StatusChanged { online });
    }
}
