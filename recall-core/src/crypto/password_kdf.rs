// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Phrase-Based Key Derivation
//!
//! PBKDF2-HMAC-SHA256 for the envelope key and plain SHA-256 for the
//! public identity string. Both come from `ring`.

use ring::{digest, pbkdf2};
use std::num::NonZeroU32;
use zeroize::Zeroize;

use super::SymmetricKey;

/// PBKDF2 iterations for phrase key derivation.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Derives a 32-byte symmetric key from a password using PBKDF2-HMAC-SHA256.
pub fn derive_key_pbkdf2(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
) -> Result<SymmetricKey, PasswordKdfError> {
    let iterations = NonZeroU32::new(iterations).ok_or(PasswordKdfError::DerivationFailed(
        "iterations must be non-zero".into(),
    ))?;

    let mut key_bytes = [0u8; 32];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        salt,
        password,
        &mut key_bytes,
    );

    let key = SymmetricKey::from_bytes(key_bytes);
    key_bytes.zeroize();
    Ok(key)
}

/// Lowercase hex SHA-256 digest of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(digest::digest(&digest::SHA256, data))
}

/// Password KDF error types.
#[derive(Debug, thiserror::Error)]
pub enum PasswordKdfError {
    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),
}
