//! Tree Store
//!
//! In-memory collection of file nodes keyed by canonical path. Parent/child
//! relations are derived from path prefixes; a child index (parent path ->
//! child paths) is maintained incrementally on every mutation but is always
//! rebuilt from the paths themselves, never from `FileNode::parent_path`.

pub mod seed;

use crate::path;
use crate::types::{FileNode, NodePatch};
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, warn};

/// Tree store shared between surfaces and the sync loop
pub type SharedTree = Arc<RwLock<TreeStore>>;

/// Create an empty shared tree
pub fn shared() -> SharedTree {
    Arc::new(RwLock::new(TreeStore::new()))
}

/// Result of merging a fetched copy into the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Store replaced; `preserved` local nodes kept because a save was pending
    Applied { nodes: usize, preserved: usize },
    /// A local mutation happened while the fetch was in flight
    Stale,
}

#[derive(Debug, Default, Clone)]
pub struct TreeStore {
    nodes: BTreeMap<String, FileNode>,
    children: HashMap<String, BTreeSet<String>>,
    /// Incremented on every local mutation, not on reconciliation
    revision: u64,
}

impl TreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a flat list; a later duplicate path replaces an earlier one.
    pub fn from_nodes(nodes: impl IntoIterator<Item = FileNode>) -> Self {
        let mut store = Self::new();
        store.load(nodes);
        store
    }

    fn load(&mut self, nodes: impl IntoIterator<Item = FileNode>) {
        self.nodes.clear();
        self.children.clear();
        for node in nodes {
            self.index_insert(node);
        }
    }

    fn index_insert(&mut self, node: FileNode) -> Option<FileNode> {
        let key = node.path.clone();
        if key != path::ROOT {
            self.children
                .entry(path::parent_of(&key).to_string())
                .or_default()
                .insert(key.clone());
        }
        self.nodes.insert(key, node)
    }

    fn index_remove(&mut self, node_path: &str) -> Option<FileNode> {
        let removed = self.nodes.remove(node_path)?;
        let parent = path::parent_of(node_path);
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.remove(node_path);
            if siblings.is_empty() {
                self.children.remove(parent);
            }
        }
        Some(removed)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileNode> {
        self.nodes.values()
    }

    /// Snapshot of every node
    pub fn snapshot(&self) -> Vec<FileNode> {
        self.nodes.values().cloned().collect()
    }

    pub fn get(&self, node_path: &str) -> Option<&FileNode> {
        self.nodes.get(node_path)
    }

    /// Nodes whose computed parent equals `dir`; never includes `dir` itself.
    pub fn children_of(&self, dir: &str) -> Vec<&FileNode> {
        self.children
            .get(dir)
            .map(|paths| {
                paths
                    .iter()
                    .filter(|p| p.as_str() != dir)
                    .filter_map(|p| self.nodes.get(p))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_children(&self, dir: &str) -> bool {
        self.children.get(dir).map_or(false, |c| !c.is_empty())
    }

    /// A path can be entered when it is a directory node, or has children
    /// even without a node of its own.
    pub fn is_navigable(&self, dir: &str) -> bool {
        match self.nodes.get(dir) {
            Some(node) => node.is_dir(),
            None => self.has_children(dir),
        }
    }

    /// Children in presentation order: directories first, then by name.
    pub fn listing(&self, dir: &str) -> Vec<&FileNode> {
        let mut entries = self.children_of(dir);
        entries.sort_by(|a, b| listing_order(a, b));
        entries
    }

    /// Transitive closure of `children_of`, breadth first.
    pub fn descendants_of(&self, dir: &str) -> Vec<&FileNode> {
        let mut out = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(dir);
        seen.insert(dir);

        while let Some(current) = queue.pop_front() {
            for child in self.children_of(current) {
                // Child paths are strictly longer than their parent; anything
                // else means a corrupted index.
                if child.path.len() <= current.len() || !seen.insert(child.path.as_str()) {
                    warn!(path = %child.path, parent = current, "skipping cyclic tree entry");
                    continue;
                }
                queue.push_back(child.path.as_str());
                out.push(child);
            }
        }
        out
    }

    /// Insert or replace the node at its path.
    pub fn insert(&mut self, node: FileNode) -> Option<FileNode> {
        self.revision += 1;
        self.index_insert(node)
    }

    /// Apply a partial update to the node at `node_path`.
    pub fn update(&mut self, node_path: &str, patch: &NodePatch) -> Option<&FileNode> {
        let mut node = self.nodes.get(node_path)?.clone();
        self.revision += 1;
        node.apply(patch);
        if node.path != node_path {
            self.index_remove(node_path);
        }
        let key = node.path.clone();
        self.index_insert(node);
        self.nodes.get(&key)
    }

    pub fn remove(&mut self, node_path: &str) -> Option<FileNode> {
        self.revision += 1;
        self.index_remove(node_path)
    }

    /// Remove `root` and every descendant as one mutation.
    pub fn remove_subtree(&mut self, root: &str) -> Vec<FileNode> {
        let doomed: Vec<String> = self
            .nodes
            .keys()
            .filter(|p| path::is_within(p, root))
            .cloned()
            .collect();
        self.revision += 1;
        doomed
            .iter()
            .filter_map(|p| self.index_remove(p))
            .collect()
    }

    /// Retarget `from` and every descendant to live under `to` as one mutation.
    ///
    /// Returns the number of nodes moved.
    pub fn rebase_subtree(&mut self, from: &str, to: &str) -> usize {
        let moving: Vec<String> = self
            .nodes
            .keys()
            .filter(|p| path::is_within(p, from))
            .cloned()
            .collect();
        if moving.is_empty() {
            return 0;
        }
        self.revision += 1;

        let mut relocated = Vec::with_capacity(moving.len());
        for old in &moving {
            if let Some(mut node) = self.index_remove(old) {
                if let Some(new_path) = path::rebase(old, from, to) {
                    node.apply(&NodePatch::relocate(&new_path));
                }
                relocated.push(node);
            }
        }
        let count = relocated.len();
        for node in relocated {
            self.index_insert(node);
        }
        debug!(from, to, count, "rebased subtree");
        count
    }

    /// Replace the whole store with a fetched copy.
    ///
    /// The copy is discarded when the local revision moved past
    /// `fetched_at_revision`: a node created or removed locally after the
    /// fetch started must not be undone by it. Paths in `preserve` keep their
    /// local version.
    pub fn reconcile(
        &mut self,
        fetched: Vec<FileNode>,
        fetched_at_revision: u64,
        preserve: &HashSet<String>,
    ) -> ReconcileOutcome {
        if self.revision != fetched_at_revision {
            return ReconcileOutcome::Stale;
        }

        let kept: Vec<FileNode> = preserve
            .iter()
            .filter_map(|p| self.nodes.get(p).cloned())
            .collect();
        let preserved = kept.len();

        self.load(fetched);
        for node in kept {
            self.index_insert(node);
        }
        ReconcileOutcome::Applied {
            nodes: self.nodes.len(),
            preserved,
        }
    }

    /// Drop everything, e.g. when the owner changes.
    pub fn clear(&mut self) {
        self.revision += 1;
        self.nodes.clear();
        self.children.clear();
    }
}

/// Directories before files; case-sensitive byte order by name within a kind.
pub fn listing_order(a: &FileNode, b: &FileNode) -> Ordering {
    match (a.is_dir(), b.is_dir()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.name.cmp(&b.name),
    }
}
