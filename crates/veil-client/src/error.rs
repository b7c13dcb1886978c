//! Client error taxonomy.
//!
//! Nothing here terminates a session: encryption failures degrade to
//! plaintext, decrypt failures surface the raw ciphertext, and
//! operations while disconnected are dropped. Errors exist so those
//! recoveries can be logged with the right severity.

use thiserror::Error;
use veil_crypto::CryptoError;

use crate::event::LogLevel;

/// Errors from client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The crypto provider failed during key generation or sealing;
    /// the affected send degrades to plaintext.
    #[error("crypto unavailable: {0}")]
    CryptoUnavailable(#[from] CryptoError),

    /// AEAD verification or decoding failed for an inbound envelope;
    /// the raw ciphertext becomes the display text.
    #[error("decrypt failed for group {group_id}: {reason}")]
    DecryptFailure {
        /// Group whose envelope failed.
        group_id: String,
        /// What went wrong (tag verification, base64, UTF-8).
        reason: String,
    },

    /// Operation attempted while not connected; dropped, not queued.
    #[error("not connected: {operation} ignored")]
    TransportDisconnected {
        /// The ignored operation.
        operation: &'static str,
    },
}

impl ClientError {
    /// Severity for the log line this error turns into.
    ///
    /// A disconnected no-op is expected traffic (debug); degraded or
    /// garbled messages deserve attention (warn).
    pub fn severity(&self) -> LogLevel {
        match self {
            Self::TransportDisconnected { .. } => LogLevel::Debug,
            Self::CryptoUnavailable(_) | Self::DecryptFailure { .. } => LogLevel::Warn,
        }
    }
}
