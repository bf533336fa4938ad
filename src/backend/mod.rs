//! Persistence Adapter
//!
//! One capability interface over two stores: the remote REST store when a
//! session is present, the on-device sled store otherwise. The backend is
//! selected once per command so signing in or out takes effect on the next
//! command and never halfway through one.

pub mod local;
pub mod remote;

use crate::error::BackendError;
use crate::session::{Session, SessionProvider};
use crate::types::{FileNode, NewNode, NodePatch};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub use local::LocalBackend;
pub use remote::{RemoteBackend, RemoteClient};

/// Which store a backend talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Remote,
    Local,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Remote => write!(f, "remote"),
            BackendKind::Local => write!(f, "local"),
        }
    }
}

/// One submitted command line, as stored in command history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub command: String,
    pub current_path: String,
    #[serde(default)]
    pub output: String,
}

impl HistoryEntry {
    pub fn new(command: impl Into<String>, current_path: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            current_path: current_path.into(),
            output: String::new(),
        }
    }
}

/// File store operations for one owner scope
#[async_trait]
pub trait FileBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Whether `update`/`delete` can address this node.
    ///
    /// Remote writes need the identity the store assigned; local writes
    /// address nodes by path.
    fn addresses(&self, node: &FileNode) -> bool;

    async fn list(&self) -> Result<Vec<FileNode>, BackendError>;

    async fn create(&self, node: NewNode) -> Result<FileNode, BackendError>;

    async fn update(&self, target: &FileNode, patch: NodePatch) -> Result<FileNode, BackendError>;

    async fn delete(&self, target: &FileNode) -> Result<(), BackendError>;

    async fn record_command(&self, entry: &HistoryEntry) -> Result<(), BackendError>;

    /// Recorded command lines, oldest first
    async fn load_history(&self) -> Result<Vec<String>, BackendError>;
}

/// Backend chosen for a single command
#[derive(Clone)]
pub enum Backend {
    Remote(RemoteBackend),
    Local(LocalBackend),
}

impl Backend {
    /// Session the remote variant authenticates with
    pub fn session(&self) -> Option<&Session> {
        match self {
            Backend::Remote(remote) => Some(remote.session()),
            Backend::Local(_) => None,
        }
    }
}

#[async_trait]
impl FileBackend for Backend {
    fn kind(&self) -> BackendKind {
        match self {
            Backend::Remote(_) => BackendKind::Remote,
            Backend::Local(_) => BackendKind::Local,
        }
    }

    fn addresses(&self, node: &FileNode) -> bool {
        match self {
            Backend::Remote(b) => b.addresses(node),
            Backend::Local(b) => b.addresses(node),
        }
    }

    async fn list(&self) -> Result<Vec<FileNode>, BackendError> {
        match self {
            Backend::Remote(b) => b.list().await,
            Backend::Local(b) => b.list().await,
        }
    }

    async fn create(&self, node: NewNode) -> Result<FileNode, BackendError> {
        match self {
            Backend::Remote(b) => b.create(node).await,
            Backend::Local(b) => b.create(node).await,
        }
    }

    async fn update(&self, target: &FileNode, patch: NodePatch) -> Result<FileNode, BackendError> {
        match self {
            Backend::Remote(b) => b.update(target, patch).await,
            Backend::Local(b) => b.update(target, patch).await,
        }
    }

    async fn delete(&self, target: &FileNode) -> Result<(), BackendError> {
        match self {
            Backend::Remote(b) => b.delete(target).await,
            Backend::Local(b) => b.delete(target).await,
        }
    }

    async fn record_command(&self, entry: &HistoryEntry) -> Result<(), BackendError> {
        match self {
            Backend::Remote(b) => b.record_command(entry).await,
            Backend::Local(b) => b.record_command(entry).await,
        }
    }

    async fn load_history(&self) -> Result<Vec<String>, BackendError> {
        match self {
            Backend::Remote(b) => b.load_history().await,
            Backend::Local(b) => b.load_history().await,
        }
    }
}

/// Picks the backend for the current session
#[derive(Clone)]
pub struct BackendSelector {
    remote: RemoteClient,
    local: LocalBackend,
    session: Arc<SessionProvider>,
}

impl BackendSelector {
    pub fn new(remote: RemoteClient, local: LocalBackend, session: Arc<SessionProvider>) -> Self {
        Self {
            remote,
            local,
            session,
        }
    }

    pub fn select(&self) -> Backend {
        match self.session.current() {
            Some(session) => Backend::Remote(self.remote.with_session(session)),
            None => Backend::Local(self.local.clone()),
        }
    }

    pub fn sessions(&self) -> &Arc<SessionProvider> {
        &self.session
    }

    pub fn local(&self) -> &LocalBackend {
        &self.local
    }

    /// Let the session provider know the remote store rejected `backend`'s credential.
    pub fn report(&self, backend: &Backend, err: &BackendError) {
        if err.is_unauthorized() {
            if let Some(session) = backend.session() {
                self.session.invalidate(session);
            }
        }
    }
}
