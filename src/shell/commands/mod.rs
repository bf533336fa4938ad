//! Dispatch table
//!
//! Handlers come in two shapes: synchronous ones that only read the tree,
//! and asynchronous ones that call the backend. The interpreter awaits both
//! uniformly.

mod inspect;
mod mutate;
mod navigation;
mod system;

use super::{Invocation, Shell};
use futures::future::BoxFuture;

pub type SyncHandler = fn(&mut Shell, &Invocation) -> String;
pub type AsyncHandler = for<'a> fn(&'a mut Shell, &'a Invocation) -> BoxFuture<'a, String>;

#[derive(Clone, Copy)]
pub enum Handler {
    Sync(SyncHandler),
    Async(AsyncHandler),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    System,
    FileSystem,
    FileOperations,
    FileAnalysis,
    Search,
}

impl Section {
    fn title(self) -> &'static str {
        match self {
            Section::System => "System Commands",
            Section::FileSystem => "File System",
            Section::FileOperations => "File Operations",
            Section::FileAnalysis => "File Analysis",
            Section::Search => "Search Commands",
        }
    }

    const ORDER: [Section; 5] = [
        Section::System,
        Section::FileSystem,
        Section::FileOperations,
        Section::FileAnalysis,
        Section::Search,
    ];
}

pub struct Command {
    pub name: &'static str,
    pub section: Section,
    pub summary: &'static str,
    pub handler: Handler,
}

pub const COMMANDS: &[Command] = &[
    Command { name: "help", section: Section::System, summary: "Show this help message", handler: Handler::Sync(system::help) },
    Command { name: "clear", section: Section::System, summary: "Clear terminal", handler: Handler::Sync(system::clear) },
    Command { name: "echo", section: Section::System, summary: "Print text", handler: Handler::Sync(system::echo) },
    Command { name: "about", section: Section::System, summary: "About this system", handler: Handler::Sync(system::about) },
    Command { name: "date", section: Section::System, summary: "Show current date", handler: Handler::Sync(system::date) },
    Command { name: "whoami", section: Section::System, summary: "Display current user", handler: Handler::Sync(system::whoami) },
    Command { name: "history", section: Section::System, summary: "Show command history", handler: Handler::Sync(system::history) },
    Command { name: "pwd", section: Section::FileSystem, summary: "Print working directory", handler: Handler::Sync(navigation::pwd) },
    Command { name: "ls", section: Section::FileSystem, summary: "List directory contents (-l, -a)", handler: Handler::Sync(navigation::ls) },
    Command { name: "cd", section: Section::FileSystem, summary: "Change directory", handler: Handler::Sync(navigation::cd) },
    Command { name: "tree", section: Section::FileSystem, summary: "Display directory tree (-L depth)", handler: Handler::Sync(navigation::tree) },
    Command { name: "cat", section: Section::FileOperations, summary: "Display file contents (-n numbers lines)", handler: Handler::Sync(inspect::cat) },
    Command { name: "touch", section: Section::FileOperations, summary: "Create empty file", handler: Handler::Async(mutate::touch) },
    Command { name: "mkdir", section: Section::FileOperations, summary: "Create directory", handler: Handler::Async(mutate::mkdir) },
    Command { name: "rm", section: Section::FileOperations, summary: "Remove file (-r directories, -rf non-empty)", handler: Handler::Async(mutate::rm) },
    Command { name: "rmdir", section: Section::FileOperations, summary: "Remove empty directory", handler: Handler::Async(mutate::rmdir) },
    Command { name: "mv", section: Section::FileOperations, summary: "Move/rename file or directory", handler: Handler::Async(mutate::mv) },
    Command { name: "cp", section: Section::FileOperations, summary: "Copy file or directory (-r)", handler: Handler::Async(mutate::cp) },
    Command { name: "nano", section: Section::FileOperations, summary: "Edit file", handler: Handler::Sync(mutate::nano) },
    Command { name: "head", section: Section::FileAnalysis, summary: "Show first lines of file (-n count)", handler: Handler::Sync(inspect::head) },
    Command { name: "tail", section: Section::FileAnalysis, summary: "Show last lines of file (-n count)", handler: Handler::Sync(inspect::tail) },
    Command { name: "wc", section: Section::FileAnalysis, summary: "Count lines, words, bytes", handler: Handler::Sync(inspect::wc) },
    Command { name: "find", section: Section::Search, summary: "Search for files (find . -name pattern)", handler: Handler::Sync(inspect::find) },
    Command { name: "grep", section: Section::Search, summary: "Search text in a file (grep pattern file)", handler: Handler::Sync(inspect::grep) },
];

pub fn lookup(verb: &str) -> Option<Handler> {
    COMMANDS.iter().find(|c| c.name == verb).map(|c| c.handler)
}

/// Help text grouped by section, in table order within a section
pub fn help_text(notes_hint: &str) -> String {
    let mut out = String::from("Available commands:");
    for section in Section::ORDER {
        out.push_str(&format!("\n  ━━━ {} ━━━", section.title()));
        for command in COMMANDS.iter().filter(|c| c.section == section) {
            out.push_str(&format!("\n  {:<8} - {}", command.name, command.summary));
        }
        out.push('\n');
    }
    out.push_str(notes_hint);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_verb_is_unique_and_listed_in_help() {
        let names: HashSet<_> = COMMANDS.iter().map(|c| c.name).collect();
        assert_eq!(names.len(), COMMANDS.len());
        let help = help_text("");
        for command in COMMANDS {
            assert!(help.contains(command.name), "{} missing from help", command.name);
        }
    }

    #[test]
    fn backend_touching_verbs_are_async() {
        for verb in ["touch", "mkdir", "rm", "rmdir", "mv", "cp"] {
            assert!(matches!(lookup(verb), Some(Handler::Async(_))), "{}", verb);
        }
        assert!(lookup("ai").is_none());
    }
}
