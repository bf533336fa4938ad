//! Core types for the virtual file system.
//!
//! `FileNode` is the only entity. Its JSON shape matches the remote store's
//! rows so the same type travels over HTTP and into the local sled store.

use crate::path;
use serde::{Deserialize, Serialize};

/// Identity assigned by the remote store
pub type NodeId = i64;

/// Node kind; immutable after creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

impl NodeKind {
    pub fn is_dir(self) -> bool {
        self == NodeKind::Directory
    }
}

/// A file or directory addressed by its canonical path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    /// Absent until the remote store persists the node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeId>,
    pub path: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Informational; traversal uses path prefixes, never this field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl FileNode {
    /// Local-only directory node at `path`
    pub fn directory(path: &str) -> Self {
        NewNode::directory(path).into_local()
    }

    /// Local-only file node at `path`
    pub fn file(path: &str, content: impl Into<String>) -> Self {
        NewNode::file(path, content).into_local()
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Content as text; absent means empty
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    /// Apply a partial update in place, keeping `name`/`parent_path` consistent with `path`
    pub fn apply(&mut self, patch: &NodePatch) {
        if let Some(path) = &patch.path {
            self.path = path.clone();
            self.name = path::basename(path).to_string();
            self.parent_path = Some(path::parent_of(path).to_string());
        }
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(content) = &patch.content {
            self.content = Some(content.clone());
        }
        if let Some(parent) = &patch.parent_path {
            self.parent_path = Some(parent.clone());
        }
    }
}

/// Creation request: a node without identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNode {
    pub path: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_path: Option<String>,
}

impl NewNode {
    pub fn new(path: &str, kind: NodeKind, content: Option<String>) -> Self {
        Self {
            path: path.to_string(),
            name: path::basename(path).to_string(),
            kind,
            content,
            parent_path: Some(path::parent_of(path).to_string()),
        }
    }

    pub fn directory(path: &str) -> Self {
        Self::new(path, NodeKind::Directory, None)
    }

    pub fn file(path: &str, content: impl Into<String>) -> Self {
        Self::new(path, NodeKind::File, Some(content.into()))
    }

    /// Copy of `node` relocated to `path`, without identity
    pub fn copy_of(node: &FileNode, path: &str) -> Self {
        Self::new(path, node.kind, node.content.clone())
    }

    /// Materialize without a remote identity
    pub fn into_local(self) -> FileNode {
        FileNode {
            id: None,
            path: self.path,
            name: self.name,
            kind: self.kind,
            content: self.content,
            parent_path: self.parent_path,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_path: Option<String>,
}

impl NodePatch {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Relocation to `path`, carrying the derived name and parent
    pub fn relocate(path: &str) -> Self {
        Self {
            name: Some(path::basename(path).to_string()),
            path: Some(path.to_string()),
            content: None,
            parent_path: Some(path::parent_of(path).to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_json_matches_remote_rows() {
        let json = r#"{"id":7,"userId":"u1","path":"/home/a.txt","name":"a.txt","type":"file",
            "content":null,"parentPath":"/home","createdAt":"2024-01-10T08:00:00.000Z",
            "updatedAt":"2024-01-10T08:00:00.000Z"}"#;
        let node: FileNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.id, Some(7));
        assert_eq!(node.kind, NodeKind::File);
        assert_eq!(node.text(), "");
        assert_eq!(node.parent_path.as_deref(), Some("/home"));
    }

    #[test]
    fn new_node_serializes_type_field() {
        let value = serde_json::to_value(NewNode::directory("/home/docs")).unwrap();
        assert_eq!(value["type"], "directory");
        assert_eq!(value["name"], "docs");
        assert_eq!(value["parentPath"], "/home");
        assert!(value.get("content").is_none());
    }

    #[test]
    fn relocate_patch_keeps_name_and_parent_consistent() {
        let mut node = FileNode::file("/home/a.txt", "x");
        node.apply(&NodePatch::relocate("/home/docs/b.txt"));
        assert_eq!(node.name, "b.txt");
        assert_eq!(node.parent_path.as_deref(), Some("/home/docs"));
        assert_eq!(node.text(), "x");
    }
}
