// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod encryption;
pub mod envelope;
pub mod password_kdf;

pub use encryption::{decrypt_cbc, encrypt_cbc, generate_iv, EncryptionError, SymmetricKey, IV_SIZE};
pub use envelope::{
    decrypt_payload, decrypt_record, encrypt_record, try_decrypt_record, CodecError, Envelope,
    ENVELOPE_VERSION,
};
pub use password_kdf::{derive_key_pbkdf2, sha256_hex, PasswordKdfError, PBKDF2_ITERATIONS};
