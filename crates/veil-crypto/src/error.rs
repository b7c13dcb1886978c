//! Crypto error types.

use thiserror::Error;

use crate::keys::IV_SIZE;

/// Errors from cryptographic operations.
///
/// None of these are fatal to a messaging session: key-generation
/// failures degrade sends to plaintext, and verification failures
/// surface the raw ciphertext as display text. The classification into
/// those recovery paths lives with the caller.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The cryptographic provider could not complete key generation.
    #[error("crypto provider unavailable: {reason}")]
    Unavailable {
        /// Provider-reported cause.
        reason: String,
    },

    /// AEAD encryption failed.
    #[error("AEAD seal failed")]
    SealFailed,

    /// AEAD tag verification failed (tamper, wrong key, or corrupt
    /// data).
    #[error("AEAD verification failed")]
    OpenFailed,

    /// An IV of the wrong width was supplied.
    #[error("initialization vector must be {IV_SIZE} bytes, got {actual}")]
    IvLength {
        /// Observed byte count.
        actual: usize,
    },
}
