//! Shared command context: local store state plus the bootstrapped user.
//!
//! The CLI runs single-user against a file-backed snapshot of the
//! in-memory store under the config directory. Every command loads the
//! snapshot, bootstraps the local identity through the same coordinator
//! the app shell uses, and saves the snapshot back on success.

use std::path::PathBuf;
use std::sync::Arc;

use reclaim_core::bootstrap::{AuthBootstrap, BootstrapStatus, IdentityProvider, StaticIdentity};
use reclaim_core::store::{MemoryStore, StoreSnapshot, UserStore};
use reclaim_core::{Config, UserRecord};

const STATE_FILE: &str = "state.json";
const LOCAL_IDENTITY: &str = "local";

pub struct CliContext {
    pub store: Arc<MemoryStore>,
    pub user: UserRecord,
    pub config: Config,
    state_path: PathBuf,
}

impl CliContext {
    pub async fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let state_path = reclaim_core::config::data_dir()?.join(STATE_FILE);

        let snapshot = if state_path.exists() {
            let raw = std::fs::read_to_string(&state_path)?;
            serde_json::from_str::<StoreSnapshot>(&raw)?
        } else {
            StoreSnapshot::default()
        };
        let store = Arc::new(MemoryStore::from_snapshot(snapshot));

        let bootstrap = AuthBootstrap::new(Arc::clone(&store));
        bootstrap.observe_identity(StaticIdentity::new(LOCAL_IDENTITY).snapshot());
        let status = bootstrap
            .drive(store.subscribe_user(LOCAL_IDENTITY))
            .await?;
        let user = match status {
            BootstrapStatus::Ready(user) => user,
            other => return Err(format!("account bootstrap did not settle: {other:?}").into()),
        };

        Ok(Self {
            store,
            user,
            config,
            state_path,
        })
    }

    /// Persist the store snapshot back to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let raw = serde_json::to_string_pretty(&self.store.snapshot())?;
        std::fs::write(&self.state_path, raw)?;
        Ok(())
    }

    /// Re-read the user record after a mutation elsewhere.
    pub async fn refresh_user(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(record) = self
            .store
            .lookup_user(LOCAL_IDENTITY)
            .await?
            .record()
            .cloned()
        {
            self.user = record;
        }
        Ok(())
    }
}
