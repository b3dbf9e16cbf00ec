//! Keystore hierarchy, key resolution and master-password gate for podlock.
//!
//! A user's files on a remote pod are encrypted with independent random
//! keys. Keys live in keystores: encrypted remote indices mapping resource
//! URL to key. Three keystore variants cover personal folders, single
//! files received from others, and folders shared with the user. The
//! registry owns the set of keystores and persists their descriptors
//! behind the master-password gate; the resolver searches keystores by
//! jurisdiction; the facade is the only entry point file I/O consumes.
//!
//! # Trust model
//!
//! Keystore indices live on partially-trusted remote storage. Every
//! variant evaluates its jurisdiction predicate before trusting a cached
//! or remote entry, so a tampered or mis-shared index cannot leak keys for
//! resources it does not own.

pub mod directory;
pub mod encryption;
mod error;
pub mod folder;
pub mod keystore;
pub mod master_password;
pub mod registry;
pub mod resolver;
mod secure_storage;
pub mod shared_file;
pub mod store;

pub use directory::{DirectoryPolicy, PodDirectoryPolicy};
pub use encryption::ResourceEncryption;
pub use error::{KeystoreError, KeystoreResult};
pub use folder::{FolderKeystore, SharedFolderKeystore};
pub use keystore::{Keystore, KeystoreDescriptor, KeystoreType, StorageDescriptor};
pub use master_password::{MasterPasswordGate, PasswordPrompt, Session};
pub use registry::KeystoreRegistry;
pub use resolver::{KeyResolver, SharedFolderBinding};
pub use secure_storage::SecureRemoteStorage;
pub use shared_file::SharedFileKeystore;
pub use store::{MemoryPodStore, PodStore, StoreError, StoreResult};
