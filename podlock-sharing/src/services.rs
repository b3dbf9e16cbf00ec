//! External access-control collaborators.
//!
//! Granting a recipient access works through an unguessable group identity
//! rather than per-user ACL entries: the link carries the group, the pod's
//! permission service gates reads on group membership.

use crate::error::SharingResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

/// Access modes for a permission grant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessModes {
    pub read: bool,
    pub write: bool,
    pub append: bool,
    pub control: bool,
}

impl AccessModes {
    pub fn read_only() -> Self {
        Self {
            read: true,
            ..Self::default()
        }
    }

    pub fn read_write() -> Self {
        Self {
            read: true,
            write: true,
            ..Self::default()
        }
    }
}

/// Access-control service of the remote pod.
#[async_trait]
pub trait PermissionService: Send + Sync {
    async fn grant_group_access(
        &self,
        resource_url: &Url,
        group_id: &Url,
        modes: AccessModes,
    ) -> SharingResult<()>;

    async fn grant_public_access(&self, resource_url: &Url, modes: AccessModes)
        -> SharingResult<()>;

    async fn has_write_access(&self, resource_url: &Url) -> SharingResult<bool>;
}

/// Group identity service of the remote pod.
#[async_trait]
pub trait GroupService: Send + Sync {
    /// Creates a fresh, unguessable, publicly-appendable identity
    /// container and returns its resource URL.
    async fn create_random_group(&self) -> SharingResult<Url>;

    /// Deletes the group resource, revoking all access granted to it.
    async fn delete_group(&self, group_id: &Url) -> SharingResult<()>;
}
