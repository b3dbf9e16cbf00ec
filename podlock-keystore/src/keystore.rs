//! Keystore contract and the shared index-cache mixin.
//!
//! A keystore is a mapping from resource URL to symmetric key, backed by
//! one encrypted remote index. Variants differ only in jurisdiction (which
//! URLs they are trusted to answer for) and in the type tag that routes
//! deserialization.
//!
//! Jurisdiction is evaluated before trusting any cached or remote entry: a
//! key must never be returned for a URL outside jurisdiction even if it is
//! present in the backing store, which defends against a tampered or
//! mis-shared keystore file leaking keys for resources it does not own.

use crate::error::{KeystoreError, KeystoreResult};
use crate::secure_storage::SecureRemoteStorage;
use crate::store::PodStore;
use async_trait::async_trait;
use podlock_crypto::SymmetricKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

/// Keystore variant discriminant, used as the serialization type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeystoreType {
    Folder,
    SharedFile,
    SharedFolder,
}

/// Where a keystore's encrypted index lives and the key that opens it.
///
/// This is exactly what a recipient needs to reconstruct the binding
/// without registry access.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageDescriptor {
    pub url: Url,
    pub key: SymmetricKey,
}

/// Serialized keystore metadata: type tag plus constructor parameters,
/// never the per-resource keys themselves.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum KeystoreDescriptor {
    Folder { root: Url, storage: StorageDescriptor },
    SharedFile { storage: StorageDescriptor },
    SharedFolder { root: Url, storage: StorageDescriptor },
}

/// A named mapping from resource URL to symmetric key.
#[async_trait]
pub trait Keystore: Send + Sync {
    fn keystore_type(&self) -> KeystoreType;

    /// Binding of this keystore's own encrypted index.
    fn storage_descriptor(&self) -> StorageDescriptor;

    /// Metadata for the registry index. Never contains resource keys.
    fn descriptor(&self) -> KeystoreDescriptor;

    /// Folder root, for folder-scoped variants.
    fn folder_root(&self) -> Option<Url> {
        None
    }

    /// Jurisdiction check. Side-effect-free with respect to trust
    /// decisions, but may lazily load the index.
    async fn handles_key_for_url(&self, url: &Url) -> KeystoreResult<bool>;

    /// Returns the key for a URL, or `KeyNotFound` if absent or out of
    /// jurisdiction.
    async fn get_key(&self, url: &Url) -> KeystoreResult<SymmetricKey>;

    /// Returns every entry, re-validating jurisdiction for each one.
    /// A violating entry means the backing store was tampered with:
    /// `InvalidKeystore`.
    async fn get_all_keys(&self) -> KeystoreResult<HashMap<Url, SymmetricKey>>;

    async fn add_key(&self, url: &Url, key: SymmetricKey) -> KeystoreResult<()>;

    async fn add_keys(&self, entries: HashMap<Url, SymmetricKey>) -> KeystoreResult<()>;
}

struct IndexState {
    keys: HashMap<Url, SymmetricKey>,
    loaded: bool,
}

/// Lazily-loaded, write-through cache over one encrypted remote index.
///
/// Mutations are read-modify-write cycles with no transactional guarantee
/// against a second concurrent writer: last writer wins. Within one
/// execution context the cache is updated before the remote write
/// completes, so `add` followed by `get` always observes the added value.
pub(crate) struct KeystoreIndex {
    storage_url: Url,
    storage: SecureRemoteStorage,
    state: RwLock<IndexState>,
}

impl KeystoreIndex {
    pub(crate) fn new(descriptor: StorageDescriptor, store: Arc<dyn PodStore>) -> Self {
        Self {
            storage: SecureRemoteStorage::new(store, descriptor.key),
            storage_url: descriptor.url,
            state: RwLock::new(IndexState {
                keys: HashMap::new(),
                loaded: false,
            }),
        }
    }

    pub(crate) fn storage_descriptor(&self) -> StorageDescriptor {
        StorageDescriptor {
            url: self.storage_url.clone(),
            key: self.storage.key().clone(),
        }
    }

    /// Loads the remote index on first use. A missing index is an empty
    /// keystore, never an error.
    async fn ensure_loaded(&self) -> KeystoreResult<()> {
        if self.state.read().await.loaded {
            return Ok(());
        }
        let mut state = self.state.write().await;
        if state.loaded {
            return Ok(());
        }
        match self
            .storage
            .load_json::<HashMap<Url, SymmetricKey>>(&self.storage_url)
            .await
        {
            Ok(keys) => {
                debug!("loaded {} entries from {}", keys.len(), self.storage_url);
                state.keys = keys;
            }
            Err(KeystoreError::NotFound(_)) => {
                debug!("index {} does not exist yet, starting empty", self.storage_url);
            }
            Err(e) => return Err(e),
        }
        state.loaded = true;
        Ok(())
    }

    pub(crate) async fn get(&self, url: &Url) -> KeystoreResult<Option<SymmetricKey>> {
        self.ensure_loaded().await?;
        Ok(self.state.read().await.keys.get(url).cloned())
    }

    pub(crate) async fn contains(&self, url: &Url) -> KeystoreResult<bool> {
        self.ensure_loaded().await?;
        Ok(self.state.read().await.keys.contains_key(url))
    }

    pub(crate) async fn entries(&self) -> KeystoreResult<HashMap<Url, SymmetricKey>> {
        self.ensure_loaded().await?;
        Ok(self.state.read().await.keys.clone())
    }

    /// Read-modify-write: cache first, then the remote index.
    pub(crate) async fn insert_all(
        &self,
        entries: HashMap<Url, SymmetricKey>,
    ) -> KeystoreResult<()> {
        self.ensure_loaded().await?;
        let snapshot = {
            let mut state = self.state.write().await;
            state.keys.extend(entries);
            state.keys.clone()
        };
        self.storage.save_json(&self.storage_url, &snapshot).await
    }
}
