//! Key resolution across all registered keystores.
//!
//! Resolution asks every keystore claiming jurisdiction and takes the
//! first success; candidate order is registry insertion order. The miss
//! case is an explicit `Option`, so create-on-miss callers never have to
//! pattern-match on error identity.

use crate::error::{KeystoreError, KeystoreResult};
use crate::keystore::{Keystore, KeystoreType, StorageDescriptor};
use crate::registry::KeystoreRegistry;
use podlock_crypto::SymmetricKey;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// What a recipient needs to reconstruct a shared-folder keystore binding
/// without access to the owner's registry.
#[derive(Clone, Debug)]
pub struct SharedFolderBinding {
    pub storage_url: Url,
    pub encryption_key: SymmetricKey,
}

pub struct KeyResolver {
    registry: Arc<KeystoreRegistry>,
}

impl KeyResolver {
    pub fn new(registry: Arc<KeystoreRegistry>) -> Self {
        Self { registry }
    }

    /// Searches every keystore claiming jurisdiction; first success wins.
    /// `None` means no candidate claimed the URL or all candidates failed.
    pub async fn lookup(&self, url: &Url) -> KeystoreResult<Option<SymmetricKey>> {
        let candidates = self.registry.keystores_handling(url).await?;
        let mut failures = Vec::new();
        for keystore in candidates {
            match keystore.get_key(url).await {
                Ok(key) => return Ok(Some(key)),
                Err(e) => failures.push(e.to_string()),
            }
        }
        if !failures.is_empty() {
            debug!("all {} candidate keystores failed for {url}: {}", failures.len(), failures.join("; "));
        }
        Ok(None)
    }

    /// Returns the key for a URL, or `KeyNotFound`.
    pub async fn get_key(&self, url: &Url) -> KeystoreResult<SymmetricKey> {
        self.lookup(url)
            .await?
            .ok_or_else(|| KeystoreError::KeyNotFound(url.to_string()))
    }

    /// Returns the existing key, or generates one and adds it to every
    /// keystore currently claiming jurisdiction (normally exactly one,
    /// the user's own folder keystore for that path).
    pub async fn get_or_create_key(&self, url: &Url) -> KeystoreResult<SymmetricKey> {
        if let Some(key) = self.lookup(url).await? {
            return Ok(key);
        }

        let candidates = self.registry.keystores_handling(url).await?;
        if candidates.is_empty() {
            return Err(KeystoreError::KeyNotFound(format!(
                "no keystore claims jurisdiction for {url}"
            )));
        }

        let key = SymmetricKey::generate();
        for keystore in &candidates {
            keystore.add_key(url, key.clone()).await?;
        }
        debug!("created key for {url} in {} keystore(s)", candidates.len());
        Ok(key)
    }

    /// Finds or creates a shared-folder keystore for the folder and
    /// returns its storage binding.
    ///
    /// A newly created keystore is backfilled with every key already known
    /// for resources under the folder, so pre-existing files become
    /// shareable retroactively.
    pub async fn get_or_create_shared_folder_keystore(
        &self,
        folder_url: &Url,
    ) -> KeystoreResult<SharedFolderBinding> {
        for keystore in self.registry.shared_folder_keystores().await? {
            if keystore.folder_root().as_ref() == Some(folder_url) {
                return Ok(binding_of(&keystore.storage_descriptor()));
            }
        }

        let created = self
            .registry
            .create_empty_shared_folder_keystore(folder_url)
            .await?;
        let created_url = created.storage_descriptor().url;

        let mut backfill: HashMap<Url, SymmetricKey> = HashMap::new();
        for keystore in self.registry.all_keystores().await? {
            if keystore.storage_descriptor().url == created_url {
                continue;
            }
            if keystore.keystore_type() == KeystoreType::SharedFile {
                // Single-file grants from others are not ours to re-share.
                continue;
            }
            match keystore.get_all_keys().await {
                Ok(entries) => backfill.extend(
                    entries
                        .into_iter()
                        .filter(|(url, _)| url.as_str().starts_with(folder_url.as_str())),
                ),
                Err(e) => warn!("skipping keystore during backfill for {folder_url}: {e}"),
            }
        }
        if !backfill.is_empty() {
            info!(
                "backfilled {} existing keys into shared-folder keystore for {folder_url}",
                backfill.len()
            );
            created.add_keys(backfill).await?;
        }

        Ok(binding_of(&created.storage_descriptor()))
    }
}

fn binding_of(descriptor: &StorageDescriptor) -> SharedFolderBinding {
    SharedFolderBinding {
        storage_url: descriptor.url.clone(),
        encryption_key: descriptor.key.clone(),
    }
}
