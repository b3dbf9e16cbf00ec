//! Encrypted remote storage binding.
//!
//! Binds one symmetric key to a pod read/write pair so callers work in
//! plaintext while the pod only ever sees ciphertext. JSON helpers cover
//! the index files the keystore layer persists.

use crate::error::KeystoreResult;
use crate::store::PodStore;
use podlock_crypto::{decrypt_string, encrypt_string, SymmetricKey};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Content type used for encrypted payloads on the pod.
const ENCRYPTED_CONTENT_TYPE: &str = "text/plain";

/// One symmetric key bound to a remote read/write pair.
#[derive(Clone)]
pub struct SecureRemoteStorage {
    store: Arc<dyn PodStore>,
    key: SymmetricKey,
}

impl SecureRemoteStorage {
    pub fn new(store: Arc<dyn PodStore>, key: SymmetricKey) -> Self {
        Self { store, key }
    }

    /// The bound key. This is the only state that needs persisting to
    /// reconstruct the binding after reload.
    pub fn key(&self) -> &SymmetricKey {
        &self.key
    }

    /// Fetches and decrypts a resource.
    ///
    /// A missing resource propagates as `NotFound`, not `WrongKey`, so
    /// callers can distinguish "never created" from "corrupted".
    pub async fn load_secure(&self, url: &Url) -> KeystoreResult<String> {
        let ciphertext = self.store.read_resource(url).await?;
        let ciphertext = String::from_utf8(ciphertext).map_err(|_| {
            podlock_crypto::CryptoError::InvalidContent(format!("non-text ciphertext at {url}"))
        })?;
        let plaintext = decrypt_string(&ciphertext, &self.key)?;
        debug!("loaded {} encrypted bytes from {url}", plaintext.len());
        Ok(plaintext)
    }

    /// Encrypts and writes a resource, overwriting prior content.
    pub async fn save_secure(&self, url: &Url, plaintext: &str) -> KeystoreResult<()> {
        let ciphertext = encrypt_string(plaintext, &self.key)?;
        self.store
            .write_resource(url, ciphertext.as_bytes(), ENCRYPTED_CONTENT_TYPE)
            .await?;
        debug!("saved {} encrypted bytes to {url}", plaintext.len());
        Ok(())
    }

    /// Loads and deserializes an encrypted JSON payload.
    pub async fn load_json<T: DeserializeOwned>(&self, url: &Url) -> KeystoreResult<T> {
        let plaintext = self.load_secure(url).await?;
        Ok(serde_json::from_str(&plaintext)?)
    }

    /// Serializes and saves a value as an encrypted JSON payload.
    pub async fn save_json<T: Serialize>(&self, url: &Url, value: &T) -> KeystoreResult<()> {
        let plaintext = serde_json::to_string(value)?;
        self.save_secure(url, &plaintext).await
    }
}
