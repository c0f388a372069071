// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Identity Module
//!
//! A recovery phrase is the only credential. From it we derive a public
//! identity string (the storage and routing key everywhere) and the
//! symmetric key that seals the envelope.

use thiserror::Error;
use zeroize::Zeroizing;

use crate::crypto::{derive_key_pbkdf2, sha256_hex, SymmetricKey, PBKDF2_ITERATIONS};

/// Fixed application salt for phrase key derivation.
pub const PHRASE_SALT: &[u8] = b"recall-profile-sync/v1";

/// Accepted phrase lengths in words.
pub const MIN_PHRASE_WORDS: usize = 12;
pub const MAX_PHRASE_WORDS: usize = 24;

/// Identity errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Recovery phrase is empty")]
    EmptyPhrase,

    #[error("Malformed recovery phrase: {0}")]
    MalformedPhrase(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),
}

/// Identity and key derived from a recovery phrase.
#[derive(Clone)]
pub struct Identity {
    id: String,
    key: SymmetricKey,
    phrase: Zeroizing<String>,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("phrase", &"[REDACTED]")
            .finish()
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Identity {
    /// Derives identity and key from a phrase (surrounding whitespace ignored).
    pub fn from_phrase(phrase: &str) -> Result<Self, IdentityError> {
        let trimmed = phrase.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::EmptyPhrase);
        }

        let key = derive_key(trimmed)?;
        Ok(Identity {
            id: sha256_hex(trimmed.as_bytes()),
            key,
            phrase: Zeroizing::new(trimmed.to_string()),
        })
    }

    /// Lowercase hex SHA-256 of the trimmed phrase.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn key(&self) -> &SymmetricKey {
        &self.key
    }

    /// The trimmed phrase, kept so tier 1 can remember it across restarts.
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Stable record id for this identity's profile.
    pub fn record_id(&self) -> String {
        format!("profile-{}", &self.id[..16])
    }
}

/// Identity string for a phrase without deriving the key.
pub fn derive_identity(phrase: &str) -> Result<String, IdentityError> {
    let trimmed = phrase.trim();
    if trimmed.is_empty() {
        return Err(IdentityError::EmptyPhrase);
    }
    Ok(sha256_hex(trimmed.as_bytes()))
}

/// Envelope key for a phrase.
pub fn derive_key(phrase: &str) -> Result<SymmetricKey, IdentityError> {
    let trimmed = phrase.trim();
    if trimmed.is_empty() {
        return Err(IdentityError::EmptyPhrase);
    }
    derive_key_pbkdf2(trimmed.as_bytes(), PHRASE_SALT, PBKDF2_ITERATIONS)
        .map_err(|e| IdentityError::KeyDerivation(e.to_string()))
}

/// Light shape check for user-entered phrases.
///
/// Wordlist and checksum validation are left to whoever generated the phrase.
pub fn validate_phrase_shape(phrase: &str) -> Result<(), IdentityError> {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    if words.is_empty() {
        return Err(IdentityError::EmptyPhrase);
    }
    if words.len() < MIN_PHRASE_WORDS || words.len() > MAX_PHRASE_WORDS {
        return Err(IdentityError::MalformedPhrase(format!(
            "expected {}-{} words, got {}",
            MIN_PHRASE_WORDS,
            MAX_PHRASE_WORDS,
            words.len()
        )));
    }
    if let Some(bad) = words
        .iter()
        .find(|w| !w.chars().all(|c| c.is_ascii_lowercase()))
    {
        return Err(IdentityError::MalformedPhrase(format!(
            "word '{}' is not lowercase ascii",
            bad
        )));
    }
    Ok(())
}
