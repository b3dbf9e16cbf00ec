//! Folder-scoped keystores.
//!
//! `FolderKeystore` answers for every resource under its folder root, as
//! long as the resource actually belongs to the keystore's configured
//! owner root. The owner-root match stops a hostile keystore from claiming
//! keys for another user's pod. `SharedFolderKeystore` carries identical
//! behavior under a distinct type tag: folders shared *with* the user must
//! not be conflated with folders the user owns when the registry decides
//! where new keys go.

use crate::directory::DirectoryPolicy;
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

/// Keystore for a folder subtree the user owns.
pub struct FolderKeystore {
    root: Url,
    owner_root: Url,
    index: KeystoreIndex,
    policy: Arc<dyn DirectoryPolicy>,
}

impl FolderKeystore {
    pub fn new(
        root: Url,
        storage: StorageDescriptor,
        store: Arc<dyn PodStore>,
        policy: Arc<dyn DirectoryPolicy>,
    ) -> KeystoreResult<Self> {
        let owner_root = policy.owner_root_of(&root)?;
        Ok(Self {
            root,
            owner_root,
            index: KeystoreIndex::new(storage, store),
            policy,
        })
    }

    pub fn root(&self) -> &Url {
        &self.root
    }

    fn in_jurisdiction(&self, url: &Url) -> bool {
        url.as_str().starts_with(self.root.as_str())
            && self
                .policy
                .owner_root_of(url)
                .map(|root| root == self.owner_root)
                .unwrap_or(false)
    }

    fn require_jurisdiction(&self, url: &Url) -> KeystoreResult<()> {
        if self.in_jurisdiction(url) {
            Ok(())
        } else {
            Err(KeystoreError::InvalidKeystore(format!(
                "{url} is outside the jurisdiction of keystore rooted at {}",
                self.root
            )))
        }
    }
}

#[async_trait]
impl Keystore for FolderKeystore {
    fn keystore_type(&self) -> KeystoreType {
        KeystoreType::Folder
    }

    fn storage_descriptor(&self) -> StorageDescriptor {
        self.index.storage_descriptor()
    }

    fn descriptor(&self) -> KeystoreDescriptor {
        KeystoreDescriptor::Folder {
            root: self.root.clone(),
            storage: self.storage_descriptor(),
        }
    }

    fn folder_root(&self) -> Option<Url> {
        Some(self.root.clone())
    }

    async fn handles_key_for_url(&self, url: &Url) -> KeystoreResult<bool> {
        Ok(self.in_jurisdiction(url))
    }

    async fn get_key(&self, url: &Url) -> KeystoreResult<SymmetricKey> {
        if !self.in_jurisdiction(url) {
            return Err(KeystoreError::KeyNotFound(url.to_string()));
        }
        self.index
            .get(url)
            .await?
            .ok_or_else(|| KeystoreError::KeyNotFound(url.to_string()))
    }

    async fn get_all_keys(&self) -> KeystoreResult<HashMap<Url, SymmetricKey>> {
        let entries = self.index.entries().await?;
        for url in entries.keys() {
            self.require_jurisdiction(url)?;
        }
        Ok(entries)
    }

    async fn add_key(&self, url: &Url, key: SymmetricKey) -> KeystoreResult<()> {
        self.add_keys(HashMap::from([(url.clone(), key)])).await
    }

    async fn add_keys(&self, entries: HashMap<Url, SymmetricKey>) -> KeystoreResult<()> {
        for url in entries.keys() {
            self.require_jurisdiction(url)?;
        }
        self.index.insert_all(entries).await
    }
}

/// Keystore for a folder subtree shared with the user by someone else.
///
/// Behaviorally identical to [`FolderKeystore`]; only the type tag differs.
pub struct SharedFolderKeystore(FolderKeystore);

impl SharedFolderKeystore {
    pub fn new(
        root: Url,
        storage: StorageDescriptor,
        store: Arc<dyn PodStore>,
        policy: Arc<dyn DirectoryPolicy>,
    ) -> KeystoreResult<Self> {
        Ok(Self(FolderKeystore::new(root, storage, store, policy)?))
    }

    pub fn root(&self) -> &Url {
        self.0.root()
    }
}

#[async_trait]
impl Keystore for SharedFolderKeystore {
    fn keystore_type(&self) -> KeystoreType {
        KeystoreType::SharedFolder
    }

    fn storage_descriptor(&self) -> StorageDescriptor {
        self.0.storage_descriptor()
    }

    fn descriptor(&self) -> KeystoreDescriptor {
        KeystoreDescriptor::SharedFolder {
            root: self.0.root.clone(),
            storage: self.storage_descriptor(),
        }
    }

    fn folder_root(&self) -> Option<Url> {
        Some(self.0.root.clone())
    }

    async fn handles_key_for_url(&self, url: &Url) -> KeystoreResult<bool> {
        self.0.handles_key_for_url(url).await
    }

    async fn get_key(&self, url: &Url) -> KeystoreResult<SymmetricKey> {
        self.0.get_key(url).await
    }

    async fn get_all_keys(&self) -> KeystoreResult<HashMap<Url, SymmetricKey>> {
        self.0.get_all_keys().await
    }

    async fn add_key(&self, url: &Url, key: SymmetricKey) -> KeystoreResult<()> {
        self.0.add_key(url, key).await
    }

    async fn add_keys(&self, entries: HashMap<Url, SymmetricKey>) -> KeystoreResult<()> {
        self.0.add_keys(entries).await
    }
}
