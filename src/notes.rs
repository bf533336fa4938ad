//! Notes surface
//!
//! A second view over the same tree: `.txt` files directly under the notes
//! directory. Edits update the tree at once and are persisted after a quiet
//! period; further edits cancel and reschedule the pending save. While a save
//! is pending or running the note's path is held in the [`SaveTracker`], so
//! the sync loop keeps the local copy instead of a stale fetched one.

use crate::backend::{BackendSelector, FileBackend};
use crate::concurrency::{SaveGuard, SaveTracker};
use crate::config::ShellConfig;
use crate::editor;
use crate::error::BackendError;
use crate::path;
use crate::tree::SharedTree;
use crate::types::{FileNode, NewNode, NodePatch};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const NOTE_EXTENSION: &str = ".txt";

/// A scheduled auto-save. The guard slot is shared with the task so either
/// side can release the path: the task once its save lands, the surface when
/// it cancels.
struct PendingSave {
    task: JoinHandle<()>,
    guard: Arc<Mutex<Option<SaveGuard>>>,
}

pub struct NotesSurface {
    tree: SharedTree,
    selector: BackendSelector,
    tracker: SaveTracker,
    notes_dir: String,
    autosave: Duration,
    selected: Option<String>,
    buffer: String,
    pending: Option<PendingSave>,
}

impl NotesSurface {
    pub fn new(
        tree: SharedTree,
        selector: BackendSelector,
        tracker: SaveTracker,
        config: &ShellConfig,
    ) -> Self {
        Self {
            tree,
            selector,
            tracker,
            notes_dir: config.notes_dir.clone(),
            autosave: config.autosave_delay(),
            selected: None,
            buffer: String::new(),
            pending: None,
        }
    }

    pub fn notes_dir(&self) -> &str {
        &self.notes_dir
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Whether the selected note has a save pending or in flight
    pub fn is_saving(&self) -> bool {
        self.selected
            .as_deref()
            .map_or(false, |p| self.tracker.is_tracked(p))
    }

    /// Canonical path of a note given its name or path; adds `.txt` if missing.
    pub fn note_path(&self, name: &str) -> String {
        let resolved = path::resolve(path::strip_quotes(name), &self.notes_dir);
        if resolved.ends_with(NOTE_EXTENSION) {
            resolved
        } else {
            format!("{}{}", resolved, NOTE_EXTENSION)
        }
    }

    /// Notes in listing order
    pub fn list(&self) -> Vec<FileNode> {
        self.tree
            .read()
            .listing(&self.notes_dir)
            .into_iter()
            .filter(|n| !n.is_dir() && n.name.ends_with(NOTE_EXTENSION))
            .cloned()
            .collect()
    }

    /// Open a note, saving the previously selected one first if it has edits pending.
    pub async fn select(&mut self, name: &str) -> Result<Option<FileNode>, BackendError> {
        self.flush().await?;
        let note_path = self.note_path(name);
        let node = self.tree.read().get(&note_path).cloned();
        match &node {
            Some(note) if !note.is_dir() => {
                self.buffer = note.text().to_string();
                self.selected = Some(note_path);
            }
            _ => {
                self.buffer.clear();
                self.selected = None;
            }
        }
        Ok(node.filter(|n| !n.is_dir()))
    }

    /// Create an empty note and select it.
    pub async fn create(&mut self, name: &str) -> Result<FileNode, BackendError> {
        self.flush().await?;
        let note_path = self.note_path(name);
        if self.tree.read().get(&note_path).is_some() {
            return Err(BackendError::PathExists(note_path));
        }
        let backend = self.selector.select();
        let created = backend
            .create(NewNode::file(&note_path, ""))
            .await
            .map_err(|err| {
                self.selector.report(&backend, &err);
                err
            })?;
        self.tree.write().insert(created.clone());
        self.buffer.clear();
        self.selected = Some(note_path);
        Ok(created)
    }

    /// Replace the selected note's content and schedule a debounced save.
    ///
    /// Must be called within a Tokio runtime. Ignored when nothing is selected.
    pub fn edit(&mut self, content: impl Into<String>) {
        let Some(note_path) = self.selected.clone() else {
            return;
        };
        self.buffer = content.into();
        self.tree
            .write()
            .update(&note_path, &NodePatch::content(self.buffer.clone()));

        // Track the new save before cancelling the old one so the path is never untracked
        let guard = self.tracker.begin(&note_path);
        self.cancel_pending();

        let slot = Arc::new(Mutex::new(Some(guard)));
        let task_slot = slot.clone();
        let delay = self.autosave;
        let tree = self.tree.clone();
        let selector = self.selector.clone();
        let content = self.buffer.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(err) = persist(&tree, &selector, &note_path, content).await {
                warn!(path = %note_path, error = %err, "auto-save failed");
            }
            task_slot.lock().take();
        });
        self.pending = Some(PendingSave { task, guard: slot });
    }

    /// Save the selected note immediately, cancelling any pending auto-save.
    pub async fn save_now(&mut self) -> Result<Option<FileNode>, BackendError> {
        let Some(note_path) = self.selected.clone() else {
            return Ok(None);
        };
        let guard = self.tracker.begin(&note_path);
        self.cancel_pending();
        let saved = persist(&self.tree, &self.selector, &note_path, self.buffer.clone()).await;
        drop(guard);
        saved.map(Some)
    }

    /// Save now if an auto-save is still waiting.
    async fn flush(&mut self) -> Result<(), BackendError> {
        let waiting = self
            .pending
            .as_ref()
            .map_or(false, |p| !p.task.is_finished());
        if waiting {
            self.save_now().await?;
        }
        self.pending = None;
        Ok(())
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.task.abort();
            pending.guard.lock().take();
        }
    }

    /// Delete a note; deselects it when it was open.
    pub async fn delete(&mut self, name: &str) -> Result<(), BackendError> {
        let note_path = self.note_path(name);
        let Some(node) = self.tree.read().get(&note_path).cloned() else {
            return Err(BackendError::MissingPath(note_path));
        };
        if self.selected.as_deref() == Some(note_path.as_str()) {
            self.cancel_pending();
            self.selected = None;
            self.buffer.clear();
        }
        let backend = self.selector.select();
        if backend.addresses(&node) {
            match backend.delete(&node).await {
                Ok(()) | Err(BackendError::MissingPath(_)) | Err(BackendError::NotFound(_)) => {}
                Err(err) => {
                    self.selector.report(&backend, &err);
                    return Err(err);
                }
            }
        }
        self.tree.write().remove(&note_path);
        Ok(())
    }

    /// Pick up changes made elsewhere (e.g. the terminal) to the selected note.
    ///
    /// Skipped while a save is pending or running so fetched content never
    /// overwrites what is being typed. Returns whether the buffer changed.
    pub fn refresh(&mut self) -> bool {
        let Some(note_path) = self.selected.clone() else {
            return false;
        };
        if self.tracker.is_tracked(&note_path) {
            debug!(path = %note_path, "refresh skipped; save in flight");
            return false;
        }
        let current = self.tree.read().get(&note_path).map(|n| n.text().to_string());
        match current {
            Some(text) if text != self.buffer => {
                self.buffer = text;
                true
            }
            Some(_) => false,
            None => {
                self.selected = None;
                self.buffer.clear();
                true
            }
        }
    }
}

/// Write through the backend and fold the stored node back into the tree.
///
/// Callers keep the path tracked until this returns.
async fn persist(
    tree: &SharedTree,
    selector: &BackendSelector,
    note_path: &str,
    content: String,
) -> Result<FileNode, BackendError> {
    let backend = selector.select();
    let saved = editor::write_file(&backend, tree, note_path, content)
        .await
        .map_err(|err| {
            selector.report(&backend, &err);
            err
        })?;

    let mut store = tree.write();
    // A newer local edit wins over what was just saved
    let newer_local = store
        .get(note_path)
        .map_or(false, |n| n.text() != saved.text());
    if newer_local {
        if let Some(id) = saved.id {
            if let Some(node) = store.get(note_path).cloned() {
                store.insert(FileNode { id: Some(id), ..node });
            }
        }
    } else {
        store.insert(saved.clone());
    }
    drop(store);
    Ok(saved)
}
