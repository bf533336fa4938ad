//! Command Interpreter
//!
//! Accepts one line at a time, dispatches it by verb and returns the text to
//! show. The backend is selected once per line; handlers re-read the shared
//! tree after every backend call instead of holding node references across
//! an await.

pub mod commands;
pub mod parse;
pub mod transcript;

use crate::backend::{Backend, BackendSelector, FileBackend, HistoryEntry};
use crate::config::ShellConfig;
use crate::editor::LineEditor;
use crate::error::BackendError;
use crate::path;
use crate::tree::SharedTree;
use crate::types::FileNode;
use commands::Handler;
use tracing::{debug, warn};

pub use transcript::{Entry, Transcript};

/// One dispatched line: verb, raw arguments and the backend chosen for it
pub struct Invocation {
    pub verb: String,
    pub args: Vec<String>,
    pub backend: Backend,
}

impl Invocation {
    /// Raw argument at `index`, quotes intact
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

pub struct Shell {
    cwd: String,
    home: String,
    tree: SharedTree,
    selector: BackendSelector,
    transcript: Transcript,
    editor: LineEditor,
    history: Vec<String>,
}

impl Shell {
    pub fn new(tree: SharedTree, selector: BackendSelector, config: &ShellConfig) -> Self {
        Self {
            cwd: config.home.clone(),
            home: config.home.clone(),
            tree,
            selector,
            transcript: Transcript::new(config.max_transcript),
            editor: LineEditor::new(),
            history: Vec::new(),
        }
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    pub fn home(&self) -> &str {
        &self.home
    }

    pub fn tree(&self) -> &SharedTree {
        &self.tree
    }

    pub fn selector(&self) -> &BackendSelector {
        &self.selector
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn editor(&self) -> &LineEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut LineEditor {
        &mut self.editor
    }

    pub fn is_editing(&self) -> bool {
        self.editor.is_editing()
    }

    /// Load recorded command lines for the current owner; failures leave history empty.
    pub async fn load_history(&mut self) {
        let backend = self.selector.select();
        match backend.load_history().await {
            Ok(lines) => self.history = lines,
            Err(err) => {
                self.selector.report(&backend, &err);
                warn!(error = %err, "failed to load command history");
            }
        }
    }

    /// Run one line and return its output; empty output is not added to the transcript.
    pub async fn submit(&mut self, line: &str) -> String {
        let line = line.trim();
        let Some(command) = parse::parse(line) else {
            return String::new();
        };
        if self.editor.is_editing() {
            return "nano: editor is open; save or exit first".to_string();
        }

        self.transcript.push(Entry::Command {
            cwd: self.cwd.clone(),
            line: line.to_string(),
        });
        self.history.push(line.to_string());

        let backend = self.selector.select();
        self.record(&backend, line).await;

        debug!(verb = %command.verb, backend = %backend.kind(), "dispatching command");
        let invocation = Invocation {
            verb: command.verb,
            args: command.args,
            backend,
        };
        let output = match commands::lookup(&invocation.verb) {
            Some(Handler::Sync(handler)) => handler(self, &invocation),
            Some(Handler::Async(handler)) => handler(self, &invocation).await,
            None => format!(
                "{}: command not found\nType 'help' for available commands.",
                invocation.verb
            ),
        };

        if !output.is_empty() {
            self.transcript.push(Entry::Output(output.clone()));
        }
        output
    }

    /// Record the line in the owner's history.
    ///
    /// Remote writes run detached so a slow server never delays the command;
    /// local writes are awaited.
    async fn record(&self, backend: &Backend, line: &str) {
        let entry = HistoryEntry::new(line, self.cwd.clone());
        match backend {
            Backend::Remote(_) => {
                let backend = backend.clone();
                tokio::spawn(async move {
                    if let Err(err) = backend.record_command(&entry).await {
                        debug!(error = %err, "failed to record command history");
                    }
                });
            }
            Backend::Local(_) => {
                if let Err(err) = backend.record_command(&entry).await {
                    debug!(error = %err, "failed to record command history");
                }
            }
        }
    }

    /// Save the editor buffer and report it in the transcript.
    pub async fn save_edit(&mut self) -> String {
        let Some(path) = self.editor.path().map(str::to_string) else {
            return String::new();
        };
        let backend = self.selector.select();
        let message = match self.editor.save(&backend, &self.tree).await {
            Ok(_) => format!("File saved: {}", path),
            Err(err) => {
                let fallback = format!("nano: error saving '{}'", path);
                self.backend_failure("nano", &backend, &err, fallback)
            }
        };
        self.transcript.push(Entry::Output(message.clone()));
        message
    }

    /// Leave the editor without saving.
    pub fn exit_edit(&mut self) {
        self.editor.exit();
    }

    pub(crate) fn set_cwd(&mut self, cwd: String) {
        self.cwd = cwd;
    }

    pub(crate) fn clear_transcript(&mut self) {
        self.transcript.clear();
    }

    /// Quote-stripped, resolved against the working directory
    pub fn resolve(&self, raw: &str) -> String {
        path::resolve_with_home(path::strip_quotes(raw), &self.cwd, &self.home)
    }

    /// Owned copy of the node at `node_path`
    pub fn node(&self, node_path: &str) -> Option<FileNode> {
        self.tree.read().get(node_path).cloned()
    }

    /// One-line message for a failed backend call.
    ///
    /// A rejected credential clears the session so the next command runs
    /// against local storage.
    pub(crate) fn backend_failure(
        &self,
        verb: &str,
        backend: &Backend,
        err: &BackendError,
        message: String,
    ) -> String {
        if err.is_unauthorized() {
            self.selector.report(backend, err);
            return format!(
                "{}: not authenticated (session expired); using local storage from the next command",
                verb
            );
        }
        warn!(verb, error = %err, "backend call failed");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{LocalBackend, RemoteClient};
    use crate::config::{RemoteConfig, ShellConfig};
    use crate::session::SessionProvider;
    use crate::tree;

    fn shell(max_transcript: usize) -> Shell {
        let remote = RemoteClient::new(&RemoteConfig::default()).unwrap();
        let selector =
            BackendSelector::new(remote, LocalBackend::temporary().unwrap(), SessionProvider::anonymous());
        let config = ShellConfig {
            max_transcript,
            ..ShellConfig::default()
        };
        Shell::new(tree::shared(), selector, &config)
    }

    #[tokio::test]
    async fn unknown_verb_is_reported_not_raised() {
        let mut shell = shell(10);
        let out = shell.submit("frobnicate now").await;
        assert_eq!(out, "frobnicate: command not found\nType 'help' for available commands.");
        assert_eq!(shell.submit("pwd").await, "/home");
    }

    #[tokio::test]
    async fn transcript_is_capped() {
        let mut shell = shell(4);
        for _ in 0..5 {
            shell.submit("echo hi").await;
        }
        assert_eq!(shell.transcript().len(), 4);
    }

    #[tokio::test]
    async fn submitted_lines_are_recorded_in_history() {
        let mut shell = shell(10);
        shell.submit("echo one").await;
        shell.submit("   ").await;
        shell.submit("pwd").await;
        assert_eq!(shell.history(), ["echo one", "pwd"]);
        let stored = shell.selector().local().load_history().await.unwrap();
        assert_eq!(stored, vec!["echo one", "pwd"]);
    }

    #[tokio::test]
    async fn lines_are_refused_while_editing() {
        let mut shell = shell(10);
        shell.submit("nano a.txt").await;
        assert!(shell.is_editing());
        assert!(shell.submit("ls").await.contains("editor is open"));
        shell.exit_edit();
        assert!(!shell.is_editing());
    }
}
