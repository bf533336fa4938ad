//! Bounded record of what the terminal has shown.

use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// A submitted line and the directory it ran in
    Command { cwd: String, line: String },
    Output(String),
}

/// Oldest entries drop first once `cap` is reached
#[derive(Debug, Clone)]
pub struct Transcript {
    entries: VecDeque<Entry>,
    cap: usize,
}

impl Transcript {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cap: cap.max(1),
        }
    }

    pub fn push(&mut self, entry: Entry) {
        if self.entries.len() == self.cap {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn last_output(&self) -> Option<&str> {
        self.entries.iter().rev().find_map(|e| match e {
            Entry::Output(text) => Some(text.as_str()),
            Entry::Command { .. } => None,
        })
    }
}
