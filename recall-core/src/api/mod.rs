// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! API Layer
//!
//! Configuration and change notification for code embedding the engine.

pub mod config;
pub mod events;

pub use config::{normalize_endpoint, RelayConfig, SyncConfig, DEFAULT_RELAY_ENDPOINT};
pub use events::{CallbackHandler, EventDispatcher, EventHandler, SyncEvent};
