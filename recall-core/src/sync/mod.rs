// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync Module
//!
//! Decides which copy of the profile is authoritative across the local
//! tiers and the relay, and keeps them converging.

pub mod engine;
pub mod error;
pub mod merge;

pub use engine::{RecordSource, SyncEngine};
pub use error::SyncError;
pub use merge::{merge, pick_winner};
