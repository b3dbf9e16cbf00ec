//! Crypto error types.

use thiserror::Error;

/// Result type for cipher operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cipher operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Authentication failed during decryption: the key is wrong or the
    /// ciphertext was tampered with. Terminal, never retried.
    #[error("decryption failed: wrong key or tampered data")]
    WrongKey,

    /// The input was not produced by this cipher (bad framing or encoding).
    #[error("invalid ciphertext: {0}")]
    InvalidContent(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),
}
