//! Keystore error taxonomy.
//!
//! Low-level cipher and storage failures are never surfaced raw: every call
//! site touching a collaborator boundary converts to one of these kinds.

use crate::store::StoreError;
use podlock_crypto::CryptoError;
use thiserror::Error;

/// Result type for keystore operations.
pub type KeystoreResult<T> = Result<T, KeystoreError>;

/// Errors that can occur in keystore and key-resolution operations.
#[derive(Debug, Error)]
pub enum KeystoreError {
    /// No keystore holds a key for the resource (or all candidates failed).
    #[error("no key found for {0}")]
    KeyNotFound(String),

    /// A keystore's backing index contains an entry outside its
    /// jurisdiction (tampered or mis-shared index).
    #[error("invalid keystore: {0}")]
    InvalidKeystore(String),

    /// The resource is outside the designated encrypted namespace.
    #[error("not inside the encrypted namespace: {0}")]
    NotEncryptedNamespace(String),

    /// The user dismissed a required prompt. Terminal, never retried.
    #[error("aborted by user")]
    UserActionAborted,

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The remote resource does not exist. Distinct from `WrongKey` so
    /// callers can tell "never created" from "corrupted".
    #[error("not found: {0}")]
    NotFound(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unexpected error: {0}")]
    Unknown(String),
}

impl From<StoreError> for KeystoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(url) => KeystoreError::NotFound(url),
            StoreError::PermissionDenied(url) => KeystoreError::PermissionDenied(url),
            other => KeystoreError::Unknown(other.to_string()),
        }
    }
}
