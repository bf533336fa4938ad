//! Line Editor (nano-mode)
//!
//! Two states: command mode and editing mode. Entering editing mode loads a
//! file's content into a buffer; nothing touches the tree or the backend
//! until an explicit save, and exit discards the buffer.

use crate::backend::{Backend, FileBackend};
use crate::error::BackendError;
use crate::tree::SharedTree;
use crate::types::{FileNode, NewNode, NodePatch};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Command,
    Editing { path: String, buffer: String },
}

#[derive(Debug, Clone, Default)]
pub struct LineEditor {
    mode: Mode,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, Mode::Editing { .. })
    }

    /// Enter editing mode on `path` with its current content.
    pub fn open(&mut self, path: &str, content: &str) {
        self.mode = Mode::Editing {
            path: path.to_string(),
            buffer: content.to_string(),
        };
    }

    pub fn path(&self) -> Option<&str> {
        match &self.mode {
            Mode::Editing { path, .. } => Some(path),
            Mode::Command => None,
        }
    }

    pub fn buffer(&self) -> Option<&str> {
        match &self.mode {
            Mode::Editing { buffer, .. } => Some(buffer),
            Mode::Command => None,
        }
    }

    /// Replace the whole buffer; ignored in command mode.
    pub fn set_buffer(&mut self, text: impl Into<String>) {
        if let Mode::Editing { buffer, .. } = &mut self.mode {
            *buffer = text.into();
        }
    }

    /// Append one line, separated from existing text by a newline.
    pub fn append_line(&mut self, line: &str) {
        if let Mode::Editing { buffer, .. } = &mut self.mode {
            if !buffer.is_empty() {
                buffer.push('\n');
            }
            buffer.push_str(line);
        }
    }

    /// Leave editing mode without saving; returns the path that was open.
    pub fn exit(&mut self) -> Option<String> {
        match std::mem::take(&mut self.mode) {
            Mode::Editing { path, .. } => Some(path),
            Mode::Command => None,
        }
    }

    /// Commit the buffer as the file's content and stay in editing mode.
    ///
    /// Updates the node when the backend can address it, otherwise creates
    /// it. Returns `None` in command mode.
    pub async fn save(
        &self,
        backend: &Backend,
        tree: &SharedTree,
    ) -> Result<Option<FileNode>, BackendError> {
        let Mode::Editing { path, buffer } = &self.mode else {
            return Ok(None);
        };
        let saved = write_file(backend, tree, path, buffer.clone()).await?;
        tree.write().insert(saved.clone());
        Ok(Some(saved))
    }
}

/// Persist `content` as the file at `path`: update when the backend can
/// address the tree's node, create otherwise. The tree is not modified.
pub async fn write_file(
    backend: &Backend,
    tree: &SharedTree,
    path: &str,
    content: String,
) -> Result<FileNode, BackendError> {
    let existing = tree.read().get(path).cloned();
    match existing {
        Some(node) if backend.addresses(&node) => {
            match backend.update(&node, NodePatch::content(content.clone())).await {
                // Store lost the node since the last sync
                Err(BackendError::MissingPath(_)) | Err(BackendError::NotFound(_)) => {
                    debug!(path, "node vanished from store; recreating");
                    backend.create(NewNode::file(path, content)).await
                }
                other => other,
            }
        }
        _ => backend.create(NewNode::file(path, content)).await,
    }
}
