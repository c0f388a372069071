// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Record Envelope
//!
//! The encrypted, versioned form of a [`ProfileRecord`]. Tiers and the relay
//! only ever see envelopes, carried as their compact JSON "payload".

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::encryption::{decrypt_cbc, encrypt_cbc, generate_iv, EncryptionError, IV_SIZE};
use super::SymmetricKey;
use crate::record::ProfileRecord;

/// Current envelope format version.
pub const ENVELOPE_VERSION: &str = "1";

/// Envelope codec errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Unsupported envelope version: {0}")]
    UnsupportedVersion(String),

    #[error("Invalid ciphertext encoding: {0}")]
    InvalidCiphertext(String),

    #[error("Invalid IV: {0}")]
    InvalidIv(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error(transparent)]
    Encryption(#[from] EncryptionError),
}

/// Encrypted record as stored in the tiers and sent to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub version: String,
    /// Base64 (standard alphabet) AES-256-CBC ciphertext.
    pub ciphertext: String,
    /// Hex encoded 16-byte IV.
    pub iv: String,
}

impl Envelope {
    /// Compact JSON form used as the wire/tier payload.
    pub fn to_payload(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(|e| CodecError::Serialization(e.to_string()))
    }

    /// Parses a payload string back into an envelope.
    pub fn from_payload(payload: &str) -> Result<Self, CodecError> {
        serde_json::from_str(payload).map_err(|e| CodecError::MalformedPayload(e.to_string()))
    }

    fn iv_bytes(&self) -> Result<[u8; IV_SIZE], CodecError> {
        let bytes = hex::decode(&self.iv).map_err(|e| CodecError::InvalidIv(e.to_string()))?;
        bytes
            .try_into()
            .map_err(|b: Vec<u8>| CodecError::InvalidIv(format!("expected 16 bytes, got {}", b.len())))
    }
}

/// Serializes and encrypts a record under a fresh random IV.
pub fn encrypt_record(record: &ProfileRecord, key: &SymmetricKey) -> Result<Envelope, CodecError> {
    let plaintext =
        serde_json::to_vec(record).map_err(|e| CodecError::Serialization(e.to_string()))?;
    let iv = generate_iv()?;
    let ciphertext = encrypt_cbc(key, &iv, &plaintext)?;

    Ok(Envelope {
        version: ENVELOPE_VERSION.to_string(),
        ciphertext: BASE64.encode(ciphertext),
        iv: hex::encode(iv),
    })
}

/// Decrypts an envelope, reporting why it failed.
pub fn try_decrypt_record(
    envelope: &Envelope,
    key: &SymmetricKey,
) -> Result<ProfileRecord, CodecError> {
    if envelope.version != ENVELOPE_VERSION {
        return Err(CodecError::UnsupportedVersion(envelope.version.clone()));
    }

    let iv = envelope.iv_bytes()?;
    let ciphertext = BASE64
        .decode(envelope.ciphertext.as_bytes())
        .map_err(|e| CodecError::InvalidCiphertext(e.to_string()))?;
    let plaintext = decrypt_cbc(key, &iv, &ciphertext)?;

    serde_json::from_slice(&plaintext).map_err(|e| CodecError::MalformedPayload(e.to_string()))
}

/// Decrypts an envelope. Any failure is logged and treated as absence.
pub fn decrypt_record(envelope: &Envelope, key: &SymmetricKey) -> Option<ProfileRecord> {
    match try_decrypt_record(envelope, key) {
        Ok(record) => Some(record),
        Err(e) => {
            debug!("Discarding undecryptable envelope: {}", e);
            None
        }
    }
}

/// Parses and decrypts a wire payload in one step.
pub fn decrypt_payload(payload: &str, key: &SymmetricKey) -> Option<(ProfileRecord, Envelope)> {
    let envelope = match Envelope::from_payload(payload) {
        Ok(envelope) => envelope,
        Err(e) => {
            debug!("Discarding malformed payload: {}", e);
            return None;
        }
    };
    decrypt_record(&envelope, key).map(|record| (record, envelope))
}
