//! Pod directory-structure policy.
//!
//! Encodes the URL conventions the keystore layer relies on: which URLs
//! are inside the encrypted namespace, who owns a URL, and where a user's
//! keystore indices live. The default policy follows the pod convention
//! `scheme://host/{pod}/`: the owner root is the origin plus the first
//! path segment.

use crate::error::{KeystoreError, KeystoreResult};
use url::{Position, Url};

/// Directory-structure conventions for a pod deployment.
pub trait DirectoryPolicy: Send + Sync {
    /// Whether the URL lives inside the designated encrypted namespace.
    fn is_in_encrypted_namespace(&self, url: &Url) -> bool;

    /// The pod root that owns this URL.
    fn owner_root_of(&self, url: &Url) -> KeystoreResult<Url>;

    /// Directory holding the owner's keystore indices.
    fn keystore_directory_for(&self, owner_root: &Url) -> KeystoreResult<Url>;

    /// Root of the owner's encrypted namespace.
    fn encrypted_namespace_for(&self, owner_root: &Url) -> KeystoreResult<Url>;
}

/// Default pod layout: `{ownerRoot}{encrypted_dir}/` for managed files and
/// `{ownerRoot}{keystore_dir}/` for keystore indices.
#[derive(Clone, Debug)]
pub struct PodDirectoryPolicy {
    encrypted_dir: String,
    keystore_dir: String,
}

impl Default for PodDirectoryPolicy {
    fn default() -> Self {
        Self {
            encrypted_dir: "crypto".to_string(),
            keystore_dir: "keystores".to_string(),
        }
    }
}

impl PodDirectoryPolicy {
    pub fn new(encrypted_dir: impl Into<String>, keystore_dir: impl Into<String>) -> Self {
        Self {
            encrypted_dir: encrypted_dir.into(),
            keystore_dir: keystore_dir.into(),
        }
    }
}

impl DirectoryPolicy for PodDirectoryPolicy {
    fn is_in_encrypted_namespace(&self, url: &Url) -> bool {
        match self
            .owner_root_of(url)
            .and_then(|root| self.encrypted_namespace_for(&root))
        {
            Ok(namespace) => url.as_str().starts_with(namespace.as_str()),
            Err(_) => false,
        }
    }

    fn owner_root_of(&self, url: &Url) -> KeystoreResult<Url> {
        let origin = &url[..Position::BeforePath];
        let pod = url
            .path_segments()
            .and_then(|mut segments| segments.next())
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| KeystoreError::Unknown(format!("url has no pod segment: {url}")))?;

        Url::parse(&format!("{origin}/{pod}/"))
            .map_err(|e| KeystoreError::Unknown(format!("bad owner root for {url}: {e}")))
    }

    fn keystore_directory_for(&self, owner_root: &Url) -> KeystoreResult<Url> {
        join_dir(owner_root, &self.keystore_dir)
    }

    fn encrypted_namespace_for(&self, owner_root: &Url) -> KeystoreResult<Url> {
        join_dir(owner_root, &self.encrypted_dir)
    }
}

fn join_dir(base: &Url, dir: &str) -> KeystoreResult<Url> {
    base.join(&format!("{dir}/"))
        .map_err(|e| KeystoreError::Unknown(format!("bad directory url under {base}: {e}")))
}
