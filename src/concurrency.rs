//! In-flight save tracking
//!
//! Paths with a pending or running save are registered here so the sync loop
//! keeps the local copy instead of overwriting it with a fetched one. Each
//! registration is an RAII guard; a path stays tracked until every guard for
//! it is dropped.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Per-path counter of saves that have not yet finished
#[derive(Clone, Default)]
pub struct SaveTracker {
    inflight: Arc<Mutex<HashMap<String, usize>>>,
}

impl SaveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `path` as having a save in flight until the guard is dropped
    pub fn begin(&self, path: &str) -> SaveGuard {
        *self.inflight.lock().entry(path.to_string()).or_insert(0) += 1;
        SaveGuard {
            tracker: self.clone(),
            path: path.to_string(),
        }
    }

    pub fn is_tracked(&self, path: &str) -> bool {
        self.inflight.lock().contains_key(path)
    }

    /// Snapshot of every tracked path
    pub fn paths(&self) -> HashSet<String> {
        self.inflight.lock().keys().cloned().collect()
    }

    fn finish(&self, path: &str) {
        let mut map = self.inflight.lock();
        if let Some(count) = map.get_mut(path) {
            *count -= 1;
            if *count == 0 {
                map.remove(path);
            }
        }
    }
}

/// Releases its path on drop
pub struct SaveGuard {
    tracker: SaveTracker,
    path: String,
}

impl SaveGuard {
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Drop for SaveGuard {
    fn drop(&mut self) {
        self.tracker.finish(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn path_is_tracked_until_last_guard_drops() {
        let tracker = SaveTracker::new();
        let first = tracker.begin("/home/notes/a.txt");
        let second = tracker.begin("/home/notes/a.txt");
        drop(first);
        assert!(tracker.is_tracked("/home/notes/a.txt"));
        drop(second);
        assert!(!tracker.is_tracked("/home/notes/a.txt"));
        assert!(tracker.paths().is_empty());
    }

    #[test]
    fn concurrent_guards_balance_out() {
        let tracker = SaveTracker::new();
        let mut handles = vec![];
        for i in 0..8 {
            let tracker = tracker.clone();
            handles.push(thread::spawn(move || {
                let path = format!("/n/{}", i % 2);
                for _ in 0..100 {
                    let _guard = tracker.begin(&path);
                    thread::yield_now();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(tracker.paths().is_empty());
    }
}
