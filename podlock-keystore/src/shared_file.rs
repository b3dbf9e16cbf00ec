//! Keystore for single files shared with the user.
//!
//! Has no folder concept: its jurisdiction is "an entry with exactly this
//! URL already exists in the loaded index", so it can never claim new URLs
//! speculatively. New entries arrive only through explicit imports of
//! received file keys.

use crate::error::{KeystoreError, KeystoreResult};
use crate::keystore::{
    Keystore, KeystoreDescriptor, KeystoreIndex, KeystoreType, StorageDescriptor,
};
use crate::store::PodStore;
use async_trait::async_trait;
use podlock_crypto::SymmetricKey;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

pub struct SharedFileKeystore {
    index: KeystoreIndex,
}

impl SharedFileKeystore {
    pub fn new(storage: StorageDescriptor, store: Arc<dyn PodStore>) -> Self {
        Self {
            index: KeystoreIndex::new(storage, store),
        }
    }
}

#[async_trait]
impl Keystore for SharedFileKeystore {
    fn keystore_type(&self) -> KeystoreType {
        KeystoreType::SharedFile
    }

    fn storage_descriptor(&self) -> StorageDescriptor {
        self.index.storage_descriptor()
    }

    fn descriptor(&self) -> KeystoreDescriptor {
        KeystoreDescriptor::SharedFile {
            storage: self.storage_descriptor(),
        }
    }

    async fn handles_key_for_url(&self, url: &Url) -> KeystoreResult<bool> {
        self.index.contains(url).await
    }

    async fn get_key(&self, url: &Url) -> KeystoreResult<SymmetricKey> {
        self.index
            .get(url)
            .await?
            .ok_or_else(|| KeystoreError::KeyNotFound(url.to_string()))
    }

    async fn get_all_keys(&self) -> KeystoreResult<HashMap<Url, SymmetricKey>> {
        // Every present entry is in jurisdiction by definition.
        self.index.entries().await
    }

    async fn add_key(&self, url: &Url, key: SymmetricKey) -> KeystoreResult<()> {
        self.index
            .insert_all(HashMap::from([(url.clone(), key)]))
            .await
    }

    async fn add_keys(&self, entries: HashMap<Url, SymmetricKey>) -> KeystoreResult<()> {
        self.index.insert_all(entries).await
    }
}
