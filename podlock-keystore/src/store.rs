//! Remote resource store contract.
//!
//! The pod is an external collaborator: this crate only needs a raw
//! read/write/delete pair over URLs. Access control on the remote side is
//! the permission service's business and surfaces here as
//! `PermissionDenied`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;
use url::Url;

/// Errors reported by the remote resource store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("resource already exists: {0}")]
    AlreadyExists(String),

    #[error("store I/O error: {0}")]
    Io(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Raw remote read/write/delete operations against the pod.
#[async_trait]
pub trait PodStore: Send + Sync {
    async fn read_resource(&self, url: &Url) -> StoreResult<Vec<u8>>;

    /// Writes a resource, overwriting any prior content at that URL.
    async fn write_resource(&self, url: &Url, bytes: &[u8], content_type: &str)
        -> StoreResult<()>;

    async fn delete_resource(&self, url: &Url) -> StoreResult<()>;
}

/// In-memory pod store with call counters.
///
/// Used by tests (cache-coherence assertions need read counts) and as a
/// scratch store for local experiments.
#[derive(Default)]
pub struct MemoryPodStore {
    resources: RwLock<HashMap<String, Vec<u8>>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryPodStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `read_resource` calls so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `write_resource` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn contains(&self, url: &Url) -> bool {
        self.resources.read().await.contains_key(url.as_str())
    }
}

#[async_trait]
impl PodStore for MemoryPodStore {
    async fn read_resource(&self, url: &Url) -> StoreResult<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.resources
            .read()
            .await
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(url.to_string()))
    }

    async fn write_resource(
        &self,
        url: &Url,
        bytes: &[u8],
        _content_type: &str,
    ) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.resources
            .write()
            .await
            .insert(url.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn delete_resource(&self, url: &Url) -> StoreResult<()> {
        self.resources
            .write()
            .await
            .remove(url.as_str())
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(url.to_string()))
    }
}
