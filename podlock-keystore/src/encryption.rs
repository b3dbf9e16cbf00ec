//! File encryption facade, the entry point consumed by UI and file I/O.

use crate::directory::DirectoryPolicy;
use crate::error::{KeystoreError, KeystoreResult};
use crate::resolver::KeyResolver;
use podlock_crypto::{decrypt_blob, encrypt_blob, SymmetricKey};
use std::sync::Arc;
use url::Url;

/// Encrypts and decrypts whole files via key resolution.
///
/// Both URL-based operations refuse URLs outside the encrypted namespace
/// before touching any key material, so stray keys are never created for
/// unmanaged paths.
pub struct ResourceEncryption {
    resolver: Arc<KeyResolver>,
    policy: Arc<dyn DirectoryPolicy>,
}

impl ResourceEncryption {
    pub fn new(resolver: Arc<KeyResolver>, policy: Arc<dyn DirectoryPolicy>) -> Self {
        Self { resolver, policy }
    }

    fn require_encrypted_namespace(&self, url: &Url) -> KeystoreResult<()> {
        if self.policy.is_in_encrypted_namespace(url) {
            Ok(())
        } else {
            Err(KeystoreError::NotEncryptedNamespace(url.to_string()))
        }
    }

    /// Encrypts file content for the URL, creating a key if none exists.
    pub async fn encrypt_file(&self, content: &[u8], url: &Url) -> KeystoreResult<Vec<u8>> {
        self.require_encrypted_namespace(url)?;
        let key = self.resolver.get_or_create_key(url).await?;
        Ok(encrypt_blob(content, &key)?)
    }

    /// Decrypts file content for the URL. The key must already exist;
    /// decryption never creates keys.
    pub async fn decrypt_file(&self, content: &[u8], url: &Url) -> KeystoreResult<Vec<u8>> {
        self.require_encrypted_namespace(url)?;
        let key = self.resolver.get_key(url).await?;
        Ok(decrypt_blob(content, &key)?)
    }

    /// Decrypts with an explicit key, bypassing resolution entirely.
    /// Used on the link-sharing read path where the key travels inside
    /// the link rather than through the registry.
    pub fn decrypt_file_with_key(
        &self,
        content: &[u8],
        key: &SymmetricKey,
    ) -> KeystoreResult<Vec<u8>> {
        Ok(decrypt_blob(content, key)?)
    }
}
