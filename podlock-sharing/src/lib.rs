//! Sharing links and access-control orchestration for podlock.
//!
//! A sharing link grants a second party decryption of specific resources
//! without full account access. File links carry the file key directly;
//! folder links carry a shared-folder keystore binding. Remote access is
//! gated by an unguessable access-control group, created per link and
//! deleted on revocation.

pub mod coordinator;
mod error;
pub mod index;
pub mod link;
pub mod services;

pub use coordinator::SharingCoordinator;
pub use error::{SharingError, SharingResult};
pub use index::{SharedByMeIndex, SharedLinkRecord};
pub use link::SharingLink;
pub use services::{AccessModes, GroupService, PermissionService};
