//! Shared test helpers: in-memory pod, canned password prompts, and a
//! fully wired keystore environment.

use async_trait::async_trait;
use podlock_keystore::{
    KeyResolver, KeystoreError, KeystoreRegistry, KeystoreResult, MasterPasswordGate,
    MemoryPodStore, PasswordPrompt, PodDirectoryPolicy, ResourceEncryption, Session,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

pub const MASTER_PASSWORD: &str = "correct-horse-battery-staple";

/// Prompt that always answers with a fixed password, or always aborts.
pub struct FixedPrompt {
    password: Option<String>,
    prompts: AtomicUsize,
}

impl FixedPrompt {
    pub fn answering(password: &str) -> Self {
        Self {
            password: Some(password.to_string()),
            prompts: AtomicUsize::new(0),
        }
    }

    pub fn aborting() -> Self {
        Self {
            password: None,
            prompts: AtomicUsize::new(0),
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    fn answer(&self) -> KeystoreResult<String> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        self.password
            .clone()
            .ok_or(KeystoreError::UserActionAborted)
    }
}

#[async_trait]
impl PasswordPrompt for FixedPrompt {
    async fn prompt_new_master_password(&self) -> KeystoreResult<String> {
        self.answer()
    }

    async fn prompt_existing_master_password(&self) -> KeystoreResult<String> {
        self.answer()
    }
}

pub fn url(s: &str) -> Url {
    Url::parse(s).expect("test url must parse")
}

pub fn owner_root() -> Url {
    url("https://pod/example/")
}

/// Fully wired environment over one in-memory pod.
pub struct TestEnv {
    pub store: Arc<MemoryPodStore>,
    pub policy: Arc<PodDirectoryPolicy>,
    pub prompt: Arc<FixedPrompt>,
    pub gate: Arc<MasterPasswordGate>,
    pub registry: Arc<KeystoreRegistry>,
    pub resolver: Arc<KeyResolver>,
    pub encryption: ResourceEncryption,
}

pub fn env() -> TestEnv {
    env_for(Arc::new(MemoryPodStore::new()), owner_root(), MASTER_PASSWORD)
}

pub fn env_for(store: Arc<MemoryPodStore>, owner_root: Url, password: &str) -> TestEnv {
    let policy = Arc::new(PodDirectoryPolicy::default());
    let prompt = Arc::new(FixedPrompt::answering(password));
    let gate = Arc::new(MasterPasswordGate::new(
        Arc::new(Session::new()),
        prompt.clone(),
    ));
    let registry = Arc::new(KeystoreRegistry::new(
        store.clone(),
        policy.clone(),
        gate.clone(),
        owner_root,
    ));
    let resolver = Arc::new(KeyResolver::new(registry.clone()));
    let encryption = ResourceEncryption::new(resolver.clone(), policy.clone());
    TestEnv {
        store,
        policy,
        prompt,
        gate,
        registry,
        resolver,
        encryption,
    }
}
