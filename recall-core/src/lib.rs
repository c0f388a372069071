// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Recall Core Library
//!
//! Keeps one encrypted profile record per recovery phrase consistent across
//! a local SQLite store, a shared fallback store and a remote relay.
//! Key derivation and hashing use the audited `ring` crate.

pub mod api;
pub mod crypto;
pub mod identity;
pub mod network;
pub mod probe;
pub mod record;
pub mod storage;
pub mod sync;

pub use api::config;

pub use api::{
    CallbackHandler, EventDispatcher, EventHandler, RelayConfig, SyncConfig, SyncEvent,
    DEFAULT_RELAY_ENDPOINT,
};
pub use crypto::{
    decrypt_record, encrypt_record, CodecError, Envelope, SymmetricKey, ENVELOPE_VERSION,
};
pub use identity::{validate_phrase_shape, Identity, IdentityError};
pub use network::{
    Clock, ConnectionState, Frame, ManualClock, MockTransport, NetworkError, RelayClient,
    RelayClientConfig, RelayEvent, SyncMessage, SystemClock, Transport,
};
#[cfg(any(feature = "network-native-tls", feature = "network-rustls"))]
pub use network::WebSocketTransport;
pub use probe::{NotPersistingReason, PersistenceProbe, ProbeFailure, ProbeOutcome};
pub use record::{Attributes, ProfileRecord};
pub use storage::{
    FallbackStore, MemoryStore, RecordStore, Storage, StorageError, UnavailableStore,
};
pub use sync::{pick_winner, RecordSource, SyncEngine, SyncError};
