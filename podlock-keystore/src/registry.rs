//! Registry of all keystores belonging to a user.
//!
//! Owns the in-memory keystore list and persists their descriptors (type
//! tag + constructor parameters, never the resource keys) as one encrypted
//! index, keyed by a key derived from the master-password hash. Keystores
//! are created on demand and destroyed only by explicit removal; nothing
//! is garbage-collected implicitly.

use crate::directory::DirectoryPolicy;
use crate::error::{KeystoreError, KeystoreResult};
use crate::folder::{FolderKeystore, SharedFolderKeystore};
use crate::keystore::{Keystore, KeystoreDescriptor, KeystoreType, StorageDescriptor};
use crate::master_password::MasterPasswordGate;
use crate::secure_storage::SecureRemoteStorage;
use crate::shared_file::SharedFileKeystore;
use crate::store::PodStore;
use podlock_crypto::{derive_key, SymmetricKey, SALT_SIZE};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

/// Domain salt for deriving the registry metadata key from the
/// master-password hash.
const REGISTRY_KEY_SALT: &[u8; SALT_SIZE] = b"podlock-registry";

/// File name of the encrypted registry metadata index.
const REGISTRY_INDEX_FILE: &str = "keystores.index.enc";

struct RegistryState {
    keystores: Vec<Arc<dyn Keystore>>,
    loaded: bool,
}

/// In-memory + persisted collection of a user's keystores.
pub struct KeystoreRegistry {
    store: Arc<dyn PodStore>,
    policy: Arc<dyn DirectoryPolicy>,
    gate: Arc<MasterPasswordGate>,
    owner_root: Url,
    state: RwLock<RegistryState>,
}

impl KeystoreRegistry {
    pub fn new(
        store: Arc<dyn PodStore>,
        policy: Arc<dyn DirectoryPolicy>,
        gate: Arc<MasterPasswordGate>,
        owner_root: Url,
    ) -> Self {
        Self {
            store,
            policy,
            gate,
            owner_root,
            state: RwLock::new(RegistryState {
                keystores: Vec::new(),
                loaded: false,
            }),
        }
    }

    pub fn owner_root(&self) -> &Url {
        &self.owner_root
    }

    /// Storage binding for the registry's own metadata index.
    async fn metadata_storage(&self) -> KeystoreResult<SecureRemoteStorage> {
        let hash = self.gate.get_master_password().await?;
        let key = derive_key(&hash, REGISTRY_KEY_SALT)?;
        Ok(SecureRemoteStorage::new(self.store.clone(), key))
    }

    fn index_url(&self) -> KeystoreResult<Url> {
        let dir = self.policy.keystore_directory_for(&self.owner_root)?;
        dir.join(REGISTRY_INDEX_FILE)
            .map_err(|e| KeystoreError::Unknown(format!("bad registry index url: {e}")))
    }

    /// Allocates a fresh storage binding under the keystore directory.
    fn new_storage_descriptor(&self) -> KeystoreResult<StorageDescriptor> {
        let dir = self.policy.keystore_directory_for(&self.owner_root)?;
        let url = dir
            .join(&format!("{}.keystore.enc", Uuid::new_v4()))
            .map_err(|e| KeystoreError::Unknown(format!("bad keystore storage url: {e}")))?;
        Ok(StorageDescriptor {
            url,
            key: SymmetricKey::generate(),
        })
    }

    fn instantiate(&self, descriptor: &KeystoreDescriptor) -> KeystoreResult<Arc<dyn Keystore>> {
        Ok(match descriptor {
            KeystoreDescriptor::Folder { root, storage } => Arc::new(FolderKeystore::new(
                root.clone(),
                storage.clone(),
                self.store.clone(),
                self.policy.clone(),
            )?),
            KeystoreDescriptor::SharedFile { storage } => Arc::new(SharedFileKeystore::new(
                storage.clone(),
                self.store.clone(),
            )),
            KeystoreDescriptor::SharedFolder { root, storage } => {
                Arc::new(SharedFolderKeystore::new(
                    root.clone(),
                    storage.clone(),
                    self.store.clone(),
                    self.policy.clone(),
                )?)
            }
        })
    }

    /// Idempotently loads the registry from its encrypted metadata index.
    ///
    /// A missing index is the first-use case: the registry initializes
    /// with its two distinguished defaults (the own-files folder keystore
    /// over the encrypted namespace, and the shared-file keystore for
    /// received keys) and persists them.
    pub async fn load_keystores(&self) -> KeystoreResult<()> {
        if self.state.read().await.loaded {
            return Ok(());
        }

        // Resolve the metadata binding before locking: this may prompt
        // for the master password.
        let storage = self.metadata_storage().await?;
        let index_url = self.index_url()?;

        let mut state = self.state.write().await;
        if state.loaded {
            return Ok(());
        }

        match storage
            .load_json::<Vec<KeystoreDescriptor>>(&index_url)
            .await
        {
            Ok(descriptors) => {
                let mut keystores = Vec::with_capacity(descriptors.len());
                for descriptor in &descriptors {
                    keystores.push(self.instantiate(descriptor)?);
                }
                debug!("loaded {} keystores from {index_url}", keystores.len());
                state.keystores = keystores;
                state.loaded = true;
            }
            Err(KeystoreError::NotFound(_)) => {
                let own_root = self.policy.encrypted_namespace_for(&self.owner_root)?;
                let own_files: Arc<dyn Keystore> = Arc::new(FolderKeystore::new(
                    own_root,
                    self.new_storage_descriptor()?,
                    self.store.clone(),
                    self.policy.clone(),
                )?);
                let shared_files: Arc<dyn Keystore> = Arc::new(SharedFileKeystore::new(
                    self.new_storage_descriptor()?,
                    self.store.clone(),
                ));
                state.keystores = vec![own_files, shared_files];
                state.loaded = true;

                let descriptors: Vec<KeystoreDescriptor> =
                    state.keystores.iter().map(|k| k.descriptor()).collect();
                drop(state);
                storage.save_json(&index_url, &descriptors).await?;
                info!("initialized keystore registry for {}", self.owner_root);
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Serializes all current keystore descriptors and overwrites the
    /// encrypted metadata index.
    pub async fn save_keystores_metadata(&self) -> KeystoreResult<()> {
        let storage = self.metadata_storage().await?;
        let descriptors: Vec<KeystoreDescriptor> = {
            let state = self.state.read().await;
            state.keystores.iter().map(|k| k.descriptor()).collect()
        };
        storage.save_json(&self.index_url()?, &descriptors).await
    }

    /// All registered keystores, loading the registry first if needed.
    pub async fn all_keystores(&self) -> KeystoreResult<Vec<Arc<dyn Keystore>>> {
        self.load_keystores().await?;
        Ok(self.state.read().await.keystores.clone())
    }

    /// Keystores whose jurisdiction covers the URL. A keystore whose
    /// jurisdiction check itself fails is skipped, not fatal: the others
    /// may still answer.
    pub async fn keystores_handling(&self, url: &Url) -> KeystoreResult<Vec<Arc<dyn Keystore>>> {
        let mut matching = Vec::new();
        for keystore in self.all_keystores().await? {
            match keystore.handles_key_for_url(url).await {
                Ok(true) => matching.push(keystore),
                Ok(false) => {}
                Err(e) => warn!("jurisdiction check failed for {url}: {e}"),
            }
        }
        Ok(matching)
    }

    /// Registers a keystore and persists the metadata index.
    pub async fn add_keystore(&self, keystore: Arc<dyn Keystore>) -> KeystoreResult<()> {
        self.load_keystores().await?;
        self.state.write().await.keystores.push(keystore);
        self.save_keystores_metadata().await
    }

    /// Creates, registers and persists a fresh shared-folder keystore with
    /// its own random storage key.
    pub async fn create_empty_shared_folder_keystore(
        &self,
        folder_url: &Url,
    ) -> KeystoreResult<Arc<SharedFolderKeystore>> {
        self.load_keystores().await?;
        let keystore = Arc::new(SharedFolderKeystore::new(
            folder_url.clone(),
            self.new_storage_descriptor()?,
            self.store.clone(),
            self.policy.clone(),
        )?);
        self.state.write().await.keystores.push(keystore.clone());
        self.save_keystores_metadata().await?;
        info!("created shared-folder keystore for {folder_url}");
        Ok(keystore)
    }

    /// The user's own index of file keys received from others. Recreated
    /// if it is missing from the registry.
    pub async fn shared_files_keystore(&self) -> KeystoreResult<Arc<dyn Keystore>> {
        if let Some(keystore) = self
            .all_keystores()
            .await?
            .into_iter()
            .find(|k| k.keystore_type() == KeystoreType::SharedFile)
        {
            return Ok(keystore);
        }
        let keystore: Arc<dyn Keystore> = Arc::new(SharedFileKeystore::new(
            self.new_storage_descriptor()?,
            self.store.clone(),
        ));
        self.add_keystore(keystore.clone()).await?;
        Ok(keystore)
    }

    /// All keystores for folders shared with the user.
    pub async fn shared_folder_keystores(&self) -> KeystoreResult<Vec<Arc<dyn Keystore>>> {
        Ok(self
            .all_keystores()
            .await?
            .into_iter()
            .filter(|k| k.keystore_type() == KeystoreType::SharedFolder)
            .collect())
    }

    /// Recipient side of folder sharing: registers a shared-folder
    /// keystore reconstructed from a link's storage binding.
    pub async fn import_shared_folder(
        &self,
        folder_url: &Url,
        storage: StorageDescriptor,
    ) -> KeystoreResult<()> {
        self.load_keystores().await?;
        let already_known = self
            .state
            .read()
            .await
            .keystores
            .iter()
            .any(|k| k.storage_descriptor().url == storage.url);
        if already_known {
            debug!("shared-folder keystore {} already imported", storage.url);
            return Ok(());
        }
        let keystore: Arc<dyn Keystore> = Arc::new(SharedFolderKeystore::new(
            folder_url.clone(),
            storage,
            self.store.clone(),
            self.policy.clone(),
        )?);
        self.add_keystore(keystore).await?;
        info!("imported shared-folder keystore for {folder_url}");
        Ok(())
    }

    /// Recipient side of file sharing: records a received single-file key.
    pub async fn import_shared_file_key(
        &self,
        file_url: &Url,
        key: SymmetricKey,
    ) -> KeystoreResult<()> {
        self.shared_files_keystore()
            .await?
            .add_key(file_url, key)
            .await?;
        info!("imported shared file key for {file_url}");
        Ok(())
    }

    /// Explicit keystore deletion: removes the remote index, then drops
    /// the descriptor from the registry metadata.
    pub async fn remove_keystore(&self, storage_url: &Url) -> KeystoreResult<()> {
        self.load_keystores().await?;
        match self.store.delete_resource(storage_url).await {
            Ok(()) => {}
            // Already gone remotely; still drop it from the registry.
            Err(crate::store::StoreError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
        {
            let mut state = self.state.write().await;
            state
                .keystores
                .retain(|k| k.storage_descriptor().url != *storage_url);
        }
        self.save_keystores_metadata().await
    }
}
