//! Crypto error types.

use thiserror::Error;

/// Errors from key confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// HMAC rejected the key material.
    #[error("invalid HMAC key length: {len}")]
    InvalidKeyLength {
        /// Length of the rejected key.
        len: usize,
    },
}
