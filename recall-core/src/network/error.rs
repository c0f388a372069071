// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network Error Types
//!
//! Error types for transport, framing and relay client operations.

use thiserror::Error;

/// Network and transport error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Connection timeout")]
    Timeout,

    #[error("Message send failed: {0}")]
    SendFailed(String),

    #[error("Message receive failed: {0}")]
    ReceiveFailed(String),

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    #[error("Frame too large: {0} bytes")]
    FrameTooLarge(usize),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Transport not connected")]
    NotConnected,

    #[error("Reconnect limit reached")]
    ReconnectLimitReached,
}

impl NetworkError {
    /// True for errors that mean the socket is gone rather than the message
    /// being bad.
    pub fn is_connection_loss(&self) -> bool {
        matches!(
            self,
            NetworkError::ConnectionClosed | NetworkError::NotConnected | NetworkError::SendFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let errors = vec![
            (
                NetworkError::ConnectionFailed("refused".into()),
                "Connection failed: refused",
            ),
            (NetworkError::ConnectionClosed, "Connection closed"),
            (NetworkError::FrameTooLarge(9), "Frame too large: 9 bytes"),
            (NetworkError::NotConnected, "Transport not connected"),
            (NetworkError::ReconnectLimitReached, "Reconnect limit reached"),
        ];

        for (error, expected) in errors {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_connection_loss_classification() {
        assert!(NetworkError::ConnectionClosed.is_connection_loss());
        assert!(NetworkError::NotConnected.is_connection_loss());
        assert!(NetworkError::SendFailed("reset".into()).is_connection_loss());
        assert!(!NetworkError::FrameTooLarge(9).is_connection_loss());
        assert!(!NetworkError::Serialization("bad".into()).is_connection_loss());
    }
}
