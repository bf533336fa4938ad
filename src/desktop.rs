//! Desktop composition root
//!
//! Owns everything the surfaces share: configuration, the session provider,
//! the Tree Store, the backend selector and the save tracker. Every surface
//! opened from here observes the same tree and gets its own Sync Loop, which
//! stops when the returned handle is dropped.

use crate::backend::{BackendSelector, LocalBackend, RemoteClient};
use crate::concurrency::SaveTracker;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::notes::NotesSurface;
use crate::session::{Session, SessionProvider};
use crate::shell::Shell;
use crate::sync::{SeedLock, SyncHandle, SyncLoop, SyncOptions};
use crate::tree::{self, SharedTree};
use std::sync::Arc;
use tracing::{info, warn};

pub struct Desktop {
    config: AppConfig,
    sessions: Arc<SessionProvider>,
    tree: SharedTree,
    selector: BackendSelector,
    tracker: SaveTracker,
    seeding: SeedLock,
}

impl Desktop {
    /// Open the on-device store at the configured location.
    pub fn open(config: AppConfig, session: Option<Session>) -> Result<Self, ApiError> {
        let store_path = config.storage.resolve()?;
        let local = LocalBackend::open(&store_path)?;
        info!(store = %store_path.display(), "opened local store");
        Self::with_local(config, session, local)
    }

    /// Build around an already opened local store.
    pub fn with_local(
        config: AppConfig,
        session: Option<Session>,
        local: LocalBackend,
    ) -> Result<Self, ApiError> {
        let remote = RemoteClient::new(&config.remote)?;
        let sessions = SessionProvider::new(session);
        let selector = BackendSelector::new(remote, local, sessions.clone());
        Ok(Self {
            config,
            sessions,
            tree: tree::shared(),
            selector,
            tracker: SaveTracker::new(),
            seeding: SeedLock::default(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn sessions(&self) -> &Arc<SessionProvider> {
        &self.sessions
    }

    pub fn tree(&self) -> &SharedTree {
        &self.tree
    }

    pub fn selector(&self) -> &BackendSelector {
        &self.selector
    }

    pub fn tracker(&self) -> &SaveTracker {
        &self.tracker
    }

    pub fn sync_loop(&self) -> SyncLoop {
        SyncLoop::new(
            self.tree.clone(),
            self.selector.clone(),
            self.tracker.clone(),
            SyncOptions::from_config(&self.config),
        )
        .with_seed_lock(self.seeding.clone())
    }

    /// Load the tree once, then keep it in sync in the background.
    async fn start_sync(&self) -> SyncHandle {
        let sync = self.sync_loop();
        let scope = self.sessions.scope();
        match sync.load().await {
            Ok(_) => sync.spawn_loaded(scope),
            Err(err) => {
                warn!(error = %err, "initial load failed; the sync loop will retry");
                sync.spawn()
            }
        }
    }

    /// Terminal surface with its command history loaded.
    pub async fn open_terminal(&self) -> (Shell, SyncHandle) {
        let handle = self.start_sync().await;
        let mut shell = Shell::new(self.tree.clone(), self.selector.clone(), &self.config.shell);
        shell.load_history().await;
        (shell, handle)
    }

    pub async fn open_notes(&self) -> (NotesSurface, SyncHandle) {
        let handle = self.start_sync().await;
        let notes = NotesSurface::new(
            self.tree.clone(),
            self.selector.clone(),
            self.tracker.clone(),
            &self.config.shell,
        );
        (notes, handle)
    }
}
