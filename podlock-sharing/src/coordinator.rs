//! Sharing workflow: create links, accept links, revoke.
//!
//! Orchestrates the sharing lifecycle between the key resolver (key and
//! keystore bindings), the pod's group and permission services (access
//! control), and the encrypted shared-by-me audit index.

use crate::error::{SharingError, SharingResult};
use crate::index::{SharedByMeIndex, SharedLinkRecord};
use crate::link::SharingLink;
use crate::services::{AccessModes, GroupService, PermissionService};
use chrono::Utc;
use podlock_crypto::{derive_key, SALT_SIZE};
use podlock_keystore::{
    KeyResolver, KeystoreError, KeystoreRegistry, MasterPasswordGate, PodStore,
    SecureRemoteStorage, StorageDescriptor,
};
use std::sync::Arc;
use tracing::info;
use url::Url;

/// Domain salt for the shared-by-me index key, derived from the
/// master-password hash like the registry metadata key but never equal
/// to it.
const SHARING_KEY_SALT: &[u8; SALT_SIZE] = b"podlock-shareidx";

/// Location of the audit index relative to the owner root.
const SHARED_BY_ME_PATH: &str = "sharing/shared-by-me.json.enc";

pub struct SharingCoordinator {
    resolver: Arc<KeyResolver>,
    registry: Arc<KeystoreRegistry>,
    permissions: Arc<dyn PermissionService>,
    groups: Arc<dyn GroupService>,
    store: Arc<dyn PodStore>,
    gate: Arc<MasterPasswordGate>,
    link_base: Url,
}

impl SharingCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        resolver: Arc<KeyResolver>,
        registry: Arc<KeystoreRegistry>,
        permissions: Arc<dyn PermissionService>,
        groups: Arc<dyn GroupService>,
        store: Arc<dyn PodStore>,
        gate: Arc<MasterPasswordGate>,
        link_base: Url,
    ) -> Self {
        Self {
            resolver,
            registry,
            permissions,
            groups,
            store,
            gate,
            link_base,
        }
    }

    /// The shared-by-me audit index, keyed by a master-derived key.
    async fn link_index(&self) -> SharingResult<SharedByMeIndex> {
        let hash = self.gate.get_master_password().await?;
        let key = derive_key(&hash, SHARING_KEY_SALT)?;
        let url = self
            .registry
            .owner_root()
            .join(SHARED_BY_ME_PATH)
            .map_err(|e| {
                SharingError::Keystore(KeystoreError::Unknown(format!(
                    "bad sharing index url: {e}"
                )))
            })?;
        Ok(SharedByMeIndex::new(
            SecureRemoteStorage::new(self.store.clone(), key),
            url,
        ))
    }

    /// Shares a single file: the file key itself travels inside the link.
    pub async fn create_file_sharing_link(
        &self,
        file_url: &Url,
        modes: AccessModes,
    ) -> SharingResult<Url> {
        let key = self.resolver.get_key(file_url).await?;
        let group = self.groups.create_random_group().await?;
        self.permissions
            .grant_group_access(file_url, &group, modes)
            .await?;

        let link = SharingLink::File {
            file: file_url.clone(),
            key,
            group: group.clone(),
        }
        .to_url(&self.link_base);

        self.record_link(&link, file_url, &group).await?;
        info!("created file sharing link for {file_url}");
        Ok(link)
    }

    /// Shares a folder subtree: the link carries the shared-folder
    /// keystore binding, and the group is granted access both to the
    /// subtree and to the keystore's own storage so the recipient's
    /// client can pull the key set.
    pub async fn create_folder_sharing_link(
        &self,
        folder_url: &Url,
        modes: AccessModes,
    ) -> SharingResult<Url> {
        let binding = self
            .resolver
            .get_or_create_shared_folder_keystore(folder_url)
            .await?;
        let group = self.groups.create_random_group().await?;

        self.permissions
            .grant_group_access(folder_url, &group, modes)
            .await?;
        let keystore_modes = if modes.write {
            AccessModes::read_write()
        } else {
            AccessModes::read_only()
        };
        self.permissions
            .grant_group_access(&binding.storage_url, &group, keystore_modes)
            .await?;

        let link = SharingLink::Folder {
            folder: folder_url.clone(),
            group: group.clone(),
            keystore: binding.storage_url,
            keystore_key: binding.encryption_key,
        }
        .to_url(&self.link_base);

        self.record_link(&link, folder_url, &group).await?;
        info!("created folder sharing link for {folder_url}");
        Ok(link)
    }

    /// Revokes a link.
    ///
    /// The group resource is deleted before the audit record is removed:
    /// a failure mid-revocation leaves the link visible for retry instead
    /// of silently losing track of an active grant.
    pub async fn deactivate_link(&self, link: &Url) -> SharingResult<()> {
        let parsed = SharingLink::parse(link)?;
        self.groups.delete_group(parsed.group()).await?;
        self.link_index().await?.remove(link).await?;
        info!("deactivated sharing link for {}", parsed.target());
        Ok(())
    }

    /// All links the user has issued and not yet revoked.
    pub async fn active_links(&self) -> SharingResult<Vec<SharedLinkRecord>> {
        self.link_index().await?.load().await
    }

    /// Recipient side: registers the share a received link describes, so
    /// the recipient's own resolver can answer for it afterwards.
    pub async fn accept_link(&self, link: &Url) -> SharingResult<()> {
        match SharingLink::parse(link)? {
            SharingLink::File { file, key, .. } => {
                self.registry.import_shared_file_key(&file, key).await?;
            }
            SharingLink::Folder {
                folder,
                keystore,
                keystore_key,
                ..
            } => {
                self.registry
                    .import_shared_folder(
                        &folder,
                        StorageDescriptor {
                            url: keystore,
                            key: keystore_key,
                        },
                    )
                    .await?;
            }
        }
        Ok(())
    }

    async fn record_link(&self, link: &Url, target: &Url, group: &Url) -> SharingResult<()> {
        self.link_index()
            .await?
            .add(SharedLinkRecord {
                link: link.clone(),
                target: target.clone(),
                group: group.clone(),
                created_at: Utc::now(),
            })
            .await
    }
}
