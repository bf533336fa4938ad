//! Sync Loop
//!
//! Keeps a surface's Tree Store aligned with whichever backend the current
//! session selects. One loop per open surface; it polls on a fixed interval,
//! restarts when the owner changes and stops when its handle goes away.

use crate::backend::{Backend, BackendSelector, FileBackend};
use crate::concurrency::SaveTracker;
use crate::config::AppConfig;
use crate::error::BackendError;
use crate::session::OwnerScope;
use std::sync::Arc;
use crate::tree::{seed, ReconcileOutcome, SharedTree};
use crate::types::FileNode;
use std::time::Duration;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Loop timing and the tree seeded into an empty store
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub interval: Duration,
    pub home: String,
    pub notes_dir: String,
}

impl SyncOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            interval: config.sync.interval(),
            home: config.shell.home.clone(),
            notes_dir: config.shell.notes_dir.clone(),
        }
    }
}

/// Serializes initial loads so only one loop seeds an empty owner
pub type SeedLock = Arc<AsyncMutex<()>>;

#[derive(Clone)]
pub struct SyncLoop {
    tree: SharedTree,
    selector: BackendSelector,
    tracker: SaveTracker,
    options: SyncOptions,
    seeding: SeedLock,
}

impl SyncLoop {
    pub fn new(
        tree: SharedTree,
        selector: BackendSelector,
        tracker: SaveTracker,
        options: SyncOptions,
    ) -> Self {
        Self {
            tree,
            selector,
            tracker,
            options,
            seeding: SeedLock::default(),
        }
    }

    /// Share the seed lock with the other loops over the same store.
    pub fn with_seed_lock(mut self, seeding: SeedLock) -> Self {
        self.seeding = seeding;
        self
    }

    /// Initial load for the current owner; seeds defaults into an empty store.
    pub async fn load(&self) -> Result<ReconcileOutcome, BackendError> {
        let _seeding = self.seeding.lock().await;
        let backend = self.selector.select();
        let started = self.tree.read().revision();
        let mut fetched = self.fetch(&backend).await?;
        if fetched.is_empty() {
            fetched = self.seed(&backend).await?;
        }
        Ok(self.apply(&backend, fetched, started))
    }

    /// One poll: list the backend and reconcile unless the tree moved meanwhile.
    pub async fn tick(&self) -> Result<ReconcileOutcome, BackendError> {
        let backend = self.selector.select();
        let started = self.tree.read().revision();
        let fetched = self.fetch(&backend).await?;
        Ok(self.apply(&backend, fetched, started))
    }

    async fn fetch(&self, backend: &Backend) -> Result<Vec<FileNode>, BackendError> {
        backend.list().await.map_err(|err| {
            self.selector.report(backend, &err);
            err
        })
    }

    fn apply(&self, backend: &Backend, fetched: Vec<FileNode>, started: u64) -> ReconcileOutcome {
        // The owner changed while the list was in flight
        if OwnerScope::of(backend.session()) != self.selector.sessions().scope() {
            return ReconcileOutcome::Stale;
        }
        let preserve = self.tracker.paths();
        let outcome = self.tree.write().reconcile(fetched, started, &preserve);
        if outcome == ReconcileOutcome::Stale {
            debug!(backend = %backend.kind(), "discarded stale fetch");
        }
        outcome
    }

    /// Create the default tree. When another writer got there first the
    /// store is listed again and that listing is used instead.
    async fn seed(&self, backend: &Backend) -> Result<Vec<FileNode>, BackendError> {
        let mut created = Vec::new();
        let mut already_seeded = false;
        for node in seed::default_nodes(&self.options.home, &self.options.notes_dir) {
            let node_path = node.path.clone();
            match backend.create(node).await {
                Ok(node) => created.push(node),
                Err(BackendError::PathExists(_)) => {
                    debug!(path = %node_path, "default node already present");
                    already_seeded = true;
                }
                Err(err) => {
                    self.selector.report(backend, &err);
                    warn!(path = %node_path, error = %err, "failed to seed default node");
                }
            }
        }
        if already_seeded {
            return self.fetch(backend).await;
        }
        info!(backend = %backend.kind(), count = created.len(), "seeded default tree");
        Ok(created)
    }

    /// Run in the background until the handle is shut down or dropped.
    pub fn spawn(self) -> SyncHandle {
        self.start(None)
    }

    /// Like [`spawn`](Self::spawn) for a tree already loaded for `scope`;
    /// the first load is skipped unless the owner has changed since.
    pub fn spawn_loaded(self, scope: OwnerScope) -> SyncHandle {
        self.start(Some(scope))
    }

    fn start(self, loaded: Option<OwnerScope>) -> SyncHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(stop_rx, loaded));
        SyncHandle {
            stop: stop_tx,
            task: Some(task),
        }
    }

    async fn run(self, mut stop: watch::Receiver<bool>, loaded: Option<OwnerScope>) {
        let mut sessions = self.selector.sessions().subscribe();
        let mut scope = self.selector.sessions().scope();
        info!(authenticated = scope.is_authenticated(), "sync loop started");

        if loaded.as_ref() != Some(&scope) {
            if loaded.is_some() {
                self.tree.write().clear();
            }
            self.load_logged().await;
        }

        let mut ticker = tokio::time::interval(self.options.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick fires immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = stop.changed() => break,
                changed = sessions.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let next = self.selector.sessions().scope();
                    if next != scope {
                        info!(authenticated = next.is_authenticated(), "owner changed; reloading tree");
                        scope = next;
                        self.tree.write().clear();
                        self.load_logged().await;
                        ticker.reset();
                    }
                }
                _ = ticker.tick() => {
                    match self.tick().await {
                        Ok(ReconcileOutcome::Applied { nodes, preserved }) => {
                            debug!(nodes, preserved, "sync tick applied");
                        }
                        Ok(ReconcileOutcome::Stale) => {}
                        Err(err) => warn!(error = %err, "sync tick failed"),
                    }
                }
            }
        }
        info!("sync loop stopped");
    }

    async fn load_logged(&self) {
        if let Err(err) = self.load().await {
            error!(error = %err, "initial load failed; retrying on next tick");
        }
    }
}

/// Owns a running sync loop; dropping it stops the loop.
pub struct SyncHandle {
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// Stop the loop and wait for it to finish its current step.
    pub async fn shutdown(mut self) {
        let _ = self.stop.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map_or(false, |t| !t.is_finished())
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
