// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network + Transport Layer
//!
//! Wire protocol and relay connection handling.
//!
//! # Architecture
//!
//! The network layer consists of:
//! - **Message types**: the four relay messages and their field aliases
//! - **Protocol layer**: frame sanitizing and JSON encoding
//! - **Transport trait**: platform-agnostic socket interface
//! - **Scheduler**: clock abstraction and keyed timers
//! - **Relay client**: reconnection, offline push slot and pull debouncing
//!
//! The message and protocol modules are always compiled so the relay server
//! can share them; the WebSocket transport needs a `network-*` feature.

pub mod error;
pub mod message;
pub mod mock;
pub mod protocol;
pub mod relay_client;
pub mod scheduler;
pub mod transport;

#[cfg(any(feature = "network-native-tls", feature = "network-rustls"))]
pub mod websocket;

// Error types
pub use error::NetworkError;

// Message types
pub use message::{MessageKind, SyncMessage};

// Protocol utilities
pub use protocol::{decode_frame, encode_message, parse_message, sanitize_frame, MAX_FRAME_SIZE};

// Transport abstraction
pub use transport::{ConnectionState, Frame, Transport, TransportConfig, TransportResult};

// Mock transport for testing
pub use mock::{MockTransport, Responder};

// WebSocket transport for production
#[cfg(any(feature = "network-native-tls", feature = "network-rustls"))]
pub use websocket::WebSocketTransport;

// Timers
pub use scheduler::{Clock, ManualClock, SystemClock, TimerQueue};

// Relay client
pub use relay_client::{
    RelayClient, RelayClientConfig, RelayEvent, DEFAULT_PULL_DEBOUNCE_MS,
    DEFAULT_RECONNECT_DELAY_MS, DEFAULT_RECONNECT_LIMIT,
};
