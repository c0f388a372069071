// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync error types.

use thiserror::Error;

use crate::crypto::CodecError;
use crate::identity::IdentityError;
use crate::network::NetworkError;
use crate::storage::StorageError;

/// Errors returned by the sync engine.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("No identity is active")]
    NoIdentity,

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("Envelope error: {0}")]
    Codec(#[from] CodecError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
}
