//! Master-password gate and login session.
//!
//! The master password never encrypts file contents: per-resource keys are
//! independent random values. The password only produces a local salted
//! hash that unlocks the registry's own metadata index, so leaking the
//! hash has limited blast radius.
//!
//! The hash lives in a `Session` constructed at login and torn down at
//! logout, passed explicitly to the components that need it.

use crate::error::{KeystoreError, KeystoreResult};
use async_trait::async_trait;
use podlock_crypto::salted_hash;
use tokio::sync::RwLock;
use tracing::debug;

/// Blocking prompt collaborator provided by the UI layer.
///
/// An aborted prompt surfaces as `UserActionAborted`.
#[async_trait]
pub trait PasswordPrompt: Send + Sync {
    /// Ask the user to choose a new master password.
    async fn prompt_new_master_password(&self) -> KeystoreResult<String>;

    /// Ask the user for their existing master password.
    async fn prompt_existing_master_password(&self) -> KeystoreResult<String>;
}

/// Session-scoped secret storage, created at login, dropped at logout.
#[derive(Default)]
pub struct Session {
    master_password_hash: RwLock<Option<String>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Gate between the user's master password and the registry metadata key.
///
/// State machine: `Unset -> Set -> (cleared) -> Unset`. While unset, any
/// hash request triggers the prompt collaborator; the returned password is
/// hashed immediately and only the hash is retained.
pub struct MasterPasswordGate {
    session: std::sync::Arc<Session>,
    prompt: std::sync::Arc<dyn PasswordPrompt>,
}

impl MasterPasswordGate {
    pub fn new(
        session: std::sync::Arc<Session>,
        prompt: std::sync::Arc<dyn PasswordPrompt>,
    ) -> Self {
        Self { session, prompt }
    }

    /// Returns the stored master-password hash, prompting if unset.
    ///
    /// A dismissed prompt or an empty password is `UserActionAborted`:
    /// the calling operation must not proceed with an empty password.
    pub async fn get_master_password(&self) -> KeystoreResult<String> {
        if let Some(hash) = self.session.master_password_hash.read().await.clone() {
            return Ok(hash);
        }

        let password = self.prompt.prompt_existing_master_password().await?;
        if password.is_empty() {
            return Err(KeystoreError::UserActionAborted);
        }
        let hash = salted_hash(&password)?;

        let mut slot = self.session.master_password_hash.write().await;
        *slot = Some(hash.clone());
        debug!("master password hash set from prompt");
        Ok(hash)
    }

    /// Re-hashes and overwrites the stored hash.
    pub async fn set_master_password(&self, password: &str) -> KeystoreResult<()> {
        if password.is_empty() {
            return Err(KeystoreError::UserActionAborted);
        }
        let hash = salted_hash(password)?;
        let mut slot = self.session.master_password_hash.write().await;
        *slot = Some(hash);
        Ok(())
    }

    /// First-time setup: prompt for a new password and store its hash.
    pub async fn prompt_and_set_new(&self) -> KeystoreResult<String> {
        let password = self.prompt.prompt_new_master_password().await?;
        if password.is_empty() {
            return Err(KeystoreError::UserActionAborted);
        }
        let hash = salted_hash(&password)?;
        let mut slot = self.session.master_password_hash.write().await;
        *slot = Some(hash.clone());
        Ok(hash)
    }

    /// Removes local state only; remote data is not re-encrypted.
    pub async fn clear_master_password(&self) {
        let mut slot = self.session.master_password_hash.write().await;
        *slot = None;
    }

    pub async fn is_set(&self) -> bool {
        self.session.master_password_hash.read().await.is_some()
    }
}
