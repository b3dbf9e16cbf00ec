//! "Shared by me" audit index.
//!
//! Encrypted record of every link the user has issued, so active grants
//! stay visible for display and revocation.

use crate::error::SharingResult;
use chrono::{DateTime, Utc};
use podlock_keystore::SecureRemoteStorage;
use serde::{Deserialize, Serialize};
use url::Url;

/// One issued sharing link.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SharedLinkRecord {
    pub link: Url,
    pub target: Url,
    pub group: Url,
    pub created_at: DateTime<Utc>,
}

/// Encrypted index of links shared by the current user.
pub struct SharedByMeIndex {
    storage: SecureRemoteStorage,
    url: Url,
}

impl SharedByMeIndex {
    pub fn new(storage: SecureRemoteStorage, url: Url) -> Self {
        Self { storage, url }
    }

    /// Loads all records; a missing index is an empty list.
    pub async fn load(&self) -> SharingResult<Vec<SharedLinkRecord>> {
        match self
            .storage
            .load_json::<Vec<SharedLinkRecord>>(&self.url)
            .await
        {
            Ok(records) => Ok(records),
            Err(podlock_keystore::KeystoreError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn add(&self, record: SharedLinkRecord) -> SharingResult<()> {
        let mut records = self.load().await?;
        records.push(record);
        self.storage.save_json(&self.url, &records).await?;
        Ok(())
    }

    pub async fn remove(&self, link: &Url) -> SharingResult<()> {
        let mut records = self.load().await?;
        records.retain(|record| record.link != *link);
        self.storage.save_json(&self.url, &records).await?;
        Ok(())
    }
}
