//! Shared test helpers: in-memory pod environment plus mock permission
//! and group services.

use async_trait::async_trait;
use podlock_keystore::{
    KeyResolver, KeystoreError, KeystoreRegistry, KeystoreResult, MasterPasswordGate,
    MemoryPodStore, PasswordPrompt, PodDirectoryPolicy, ResourceEncryption, Session,
};
use podlock_sharing::{
    AccessModes, GroupService, PermissionService, SharingCoordinator, SharingError, SharingResult,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

pub const MASTER_PASSWORD: &str = "correct-horse-battery-staple";

pub fn url(s: &str) -> Url {
    Url::parse(s).expect("test url must parse")
}

pub fn owner_root() -> Url {
    url("https://pod/example/")
}

pub fn link_base() -> Url {
    url("https://app.podlock.dev/share")
}

struct FixedPrompt(String);

#[async_trait]
impl PasswordPrompt for FixedPrompt {
    async fn prompt_new_master_password(&self) -> KeystoreResult<String> {
        Ok(self.0.clone())
    }

    async fn prompt_existing_master_password(&self) -> KeystoreResult<String> {
        Ok(self.0.clone())
    }
}

/// Records every grant it is asked to make.
#[derive(Default)]
pub struct MockPermissionService {
    grants: Mutex<Vec<(Url, Url, AccessModes)>>,
}

impl MockPermissionService {
    pub async fn grants(&self) -> Vec<(Url, Url, AccessModes)> {
        self.grants.lock().await.clone()
    }

    pub async fn granted_resources(&self) -> Vec<Url> {
        self.grants.lock().await.iter().map(|(r, _, _)| r.clone()).collect()
    }
}

#[async_trait]
impl PermissionService for MockPermissionService {
    async fn grant_group_access(
        &self,
        resource_url: &Url,
        group_id: &Url,
        modes: AccessModes,
    ) -> SharingResult<()> {
        self.grants
            .lock()
            .await
            .push((resource_url.clone(), group_id.clone(), modes));
        Ok(())
    }

    async fn grant_public_access(
        &self,
        resource_url: &Url,
        modes: AccessModes,
    ) -> SharingResult<()> {
        self.grants
            .lock()
            .await
            .push((resource_url.clone(), resource_url.clone(), modes));
        Ok(())
    }

    async fn has_write_access(&self, _resource_url: &Url) -> SharingResult<bool> {
        Ok(true)
    }
}

/// Allocates sequential group resources; deletion can be forced to fail.
#[derive(Default)]
pub struct MockGroupService {
    next_id: AtomicUsize,
    groups: Mutex<HashSet<Url>>,
    fail_delete: AtomicBool,
}

impl MockGroupService {
    pub async fn group_exists(&self, group: &Url) -> bool {
        self.groups.lock().await.contains(group)
    }

    pub fn fail_next_delete(&self) {
        self.fail_delete.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl GroupService for MockGroupService {
    async fn create_random_group(&self) -> SharingResult<Url> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let group = url(&format!("https://pod/example/groups/group-{id}"));
        self.groups.lock().await.insert(group.clone());
        Ok(group)
    }

    async fn delete_group(&self, group_id: &Url) -> SharingResult<()> {
        if self.fail_delete.swap(false, Ordering::SeqCst) {
            return Err(SharingError::Group("simulated delete failure".into()));
        }
        if self.groups.lock().await.remove(group_id) {
            Ok(())
        } else {
            Err(SharingError::Group(format!("no such group: {group_id}")))
        }
    }
}

pub struct TestEnv {
    pub store: Arc<MemoryPodStore>,
    pub registry: Arc<KeystoreRegistry>,
    pub resolver: Arc<KeyResolver>,
    pub encryption: ResourceEncryption,
    pub permissions: Arc<MockPermissionService>,
    pub groups: Arc<MockGroupService>,
    pub coordinator: SharingCoordinator,
}

pub fn env() -> TestEnv {
    env_for(Arc::new(MemoryPodStore::new()), owner_root(), MASTER_PASSWORD)
}

pub fn env_for(store: Arc<MemoryPodStore>, owner_root: Url, password: &str) -> TestEnv {
    let policy = Arc::new(PodDirectoryPolicy::default());
    let gate = Arc::new(MasterPasswordGate::new(
        Arc::new(Session::new()),
        Arc::new(FixedPrompt(password.to_string())),
    ));
    let registry = Arc::new(KeystoreRegistry::new(
        store.clone(),
        policy.clone(),
        gate.clone(),
        owner_root,
    ));
    let resolver = Arc::new(KeyResolver::new(registry.clone()));
    let encryption = ResourceEncryption::new(resolver.clone(), policy);
    let permissions = Arc::new(MockPermissionService::default());
    let groups = Arc::new(MockGroupService::default());
    let coordinator = SharingCoordinator::new(
        resolver.clone(),
        registry.clone(),
        permissions.clone(),
        groups.clone(),
        store.clone(),
        gate,
        link_base(),
    );
    TestEnv {
        store,
        registry,
        resolver,
        encryption,
        permissions,
        groups,
        coordinator,
    }
}
