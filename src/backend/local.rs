//! On-device store for the anonymous owner.
//!
//! The whole tree lives as one JSON document under a single sled key, the
//! command history under another. Nodes are addressed by path; identities
//! are never assigned.

use super::{BackendKind, FileBackend, HistoryEntry};
use crate::error::{ApiError, BackendError};
use crate::types::{FileNode, NewNode, NodePatch};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const FILES_KEY: &str = "terminal-files";
const HISTORY_KEY: &str = "terminal-history";

/// Most recent command lines kept on device
pub const HISTORY_CAP: usize = 200;

#[derive(Clone)]
pub struct LocalBackend {
    db: sled::Db,
    /// Serializes read-modify-write of the files document
    write_lock: Arc<Mutex<()>>,
}

impl LocalBackend {
    pub fn open(path: &Path) -> Result<Self, ApiError> {
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        debug!(path = %path.display(), "opened local store");
        Ok(Self::from_db(db))
    }

    /// In-memory store discarded on drop
    pub fn temporary() -> Result<Self, ApiError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self::from_db(db))
    }

    pub fn from_db(db: sled::Db) -> Self {
        Self {
            db,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    fn read_nodes(&self) -> Result<Vec<FileNode>, BackendError> {
        match self.db.get(FILES_KEY)? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    fn write_nodes(&self, nodes: &[FileNode]) -> Result<(), BackendError> {
        let bytes = serde_json::to_vec(nodes)?;
        self.db.insert(FILES_KEY, bytes)?;
        self.db.flush()?;
        Ok(())
    }

    fn read_history(&self) -> Result<Vec<String>, BackendError> {
        match self.db.get(HISTORY_KEY)? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[async_trait]
impl FileBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn addresses(&self, _node: &FileNode) -> bool {
        true
    }

    async fn list(&self) -> Result<Vec<FileNode>, BackendError> {
        let mut nodes = self.read_nodes()?;
        nodes.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(nodes)
    }

    async fn create(&self, node: NewNode) -> Result<FileNode, BackendError> {
        let _guard = self.write_lock.lock();
        let mut nodes = self.read_nodes()?;
        if nodes.iter().any(|n| n.path == node.path) {
            return Err(BackendError::PathExists(node.path));
        }
        let mut created = node.into_local();
        let stamp = now();
        created.created_at = Some(stamp.clone());
        created.updated_at = Some(stamp);
        nodes.push(created.clone());
        self.write_nodes(&nodes)?;
        Ok(created)
    }

    async fn update(&self, target: &FileNode, patch: NodePatch) -> Result<FileNode, BackendError> {
        let _guard = self.write_lock.lock();
        let mut nodes = self.read_nodes()?;
        if let Some(new_path) = &patch.path {
            if new_path != &target.path && nodes.iter().any(|n| &n.path == new_path) {
                return Err(BackendError::PathExists(new_path.clone()));
            }
        }
        let node = nodes
            .iter_mut()
            .find(|n| n.path == target.path)
            .ok_or_else(|| BackendError::MissingPath(target.path.clone()))?;
        node.apply(&patch);
        node.updated_at = Some(now());
        let updated = node.clone();
        self.write_nodes(&nodes)?;
        Ok(updated)
    }

    async fn delete(&self, target: &FileNode) -> Result<(), BackendError> {
        let _guard = self.write_lock.lock();
        let mut nodes = self.read_nodes()?;
        let before = nodes.len();
        nodes.retain(|n| n.path != target.path);
        if nodes.len() == before {
            return Err(BackendError::MissingPath(target.path.clone()));
        }
        self.write_nodes(&nodes)
    }

    async fn record_command(&self, entry: &HistoryEntry) -> Result<(), BackendError> {
        let _guard = self.write_lock.lock();
        let mut history = self.read_history()?;
        history.push(entry.command.clone());
        if history.len() > HISTORY_CAP {
            let excess = history.len() - HISTORY_CAP;
            history.drain(..excess);
        }
        self.db.insert(HISTORY_KEY, serde_json::to_vec(&history)?)?;
        Ok(())
    }

    async fn load_history(&self) -> Result<Vec<String>, BackendError> {
        self.read_history()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_update_delete_by_path() {
        let store = LocalBackend::temporary().unwrap();
        let created = store.create(NewNode::file("/home/a.txt", "one")).await.unwrap();
        assert!(created.id.is_none());
        assert!(created.created_at.is_some());

        let updated = store.update(&created, NodePatch::content("two")).await.unwrap();
        assert_eq!(updated.text(), "two");
        assert_eq!(store.list().await.unwrap()[0].text(), "two");

        store.delete(&updated).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_path_is_rejected() {
        let store = LocalBackend::temporary().unwrap();
        store.create(NewNode::directory("/home")).await.unwrap();
        let err = store.create(NewNode::directory("/home")).await.unwrap_err();
        assert!(matches!(err, BackendError::PathExists(p) if p == "/home"));
    }

    #[tokio::test]
    async fn missing_node_reports_its_path() {
        let store = LocalBackend::temporary().unwrap();
        let ghost = FileNode::file("/ghost.txt", "");
        assert!(matches!(
            store.delete(&ghost).await,
            Err(BackendError::MissingPath(p)) if p == "/ghost.txt"
        ));
    }

    #[tokio::test]
    async fn history_is_capped_oldest_first() {
        let store = LocalBackend::temporary().unwrap();
        for i in 0..(HISTORY_CAP + 5) {
            store
                .record_command(&HistoryEntry::new(format!("echo {}", i), "/home"))
                .await
                .unwrap();
        }
        let history = store.load_history().await.unwrap();
        assert_eq!(history.len(), HISTORY_CAP);
        assert_eq!(history.first().map(String::as_str), Some("echo 5"));
        assert_eq!(history.last().map(String::as_str), Some("echo 204"));
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        {
            let store = LocalBackend::open(dir.path()).unwrap();
            store.create(NewNode::file("/home/keep.txt", "k")).await.unwrap();
        }
        let store = LocalBackend::open(dir.path()).unwrap();
        let nodes = store.list().await.unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].text(), "k");
    }
}
