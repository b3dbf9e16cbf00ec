//! Sharing error types.

use podlock_crypto::CryptoError;
use podlock_keystore::KeystoreError;
use thiserror::Error;

/// Result type for sharing operations.
pub type SharingResult<T> = Result<T, SharingError>;

/// Errors that can occur while creating, importing or revoking shares.
#[derive(Debug, Error)]
pub enum SharingError {
    #[error("invalid sharing link: {0}")]
    InvalidLink(String),

    #[error("permission grant failed: {0}")]
    Permission(String),

    #[error("group operation failed: {0}")]
    Group(String),

    #[error(transparent)]
    Keystore(#[from] KeystoreError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
