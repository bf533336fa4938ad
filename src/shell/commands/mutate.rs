//! Verbs that write through the backend.
//!
//! Each handler validates against the tree, performs its backend calls in
//! order and only then applies the result to the tree. Multi-step verbs are
//! not rolled back when a later step fails.

use crate::backend::FileBackend;
use crate::error::BackendError;
use crate::path;
use crate::shell::parse::{self, flag_chars};
use crate::shell::{Invocation, Shell};
use crate::types::{FileNode, NewNode, NodePatch};
use futures::future::BoxFuture;
use tracing::debug;

/// Node plus every descendant, cloned so nothing borrows the tree across an await
fn subtree(shell: &Shell, root: &FileNode) -> Vec<FileNode> {
    let tree = shell.tree().read();
    let mut nodes = vec![root.clone()];
    if root.is_dir() {
        nodes.extend(tree.descendants_of(&root.path).into_iter().cloned());
    }
    nodes
}

fn depth(node: &FileNode) -> usize {
    node.path.matches('/').count()
}

/// Where `source` lands: nested under `dest` when that is an existing directory.
fn destination(shell: &Shell, source: &FileNode, dest_arg: &str) -> String {
    let dest = shell.resolve(dest_arg);
    match shell.node(&dest) {
        Some(node) if node.is_dir() => path::child_path(&dest, &source.name),
        _ => dest,
    }
}

pub(super) fn touch<'a>(shell: &'a mut Shell, inv: &'a Invocation) -> BoxFuture<'a, String> {
    Box::pin(async move {
        let Some(arg) = parse::operand(inv.arg(0)) else {
            return "touch: missing file operand".to_string();
        };
        let raw = inv.arg(0).unwrap_or(arg);
        let target = shell.resolve(arg);
        if shell.node(&target).is_some() {
            return String::new();
        }
        match inv.backend.create(NewNode::file(&target, "")).await {
            Ok(node) => {
                shell.tree().write().insert(node);
                String::new()
            }
            Err(BackendError::PathExists(_)) => String::new(),
            Err(err) => shell.backend_failure(
                "touch",
                &inv.backend,
                &err,
                format!("touch: error creating file '{}'", raw),
            ),
        }
    })
}

pub(super) fn mkdir<'a>(shell: &'a mut Shell, inv: &'a Invocation) -> BoxFuture<'a, String> {
    Box::pin(async move {
        let Some(arg) = parse::operand(inv.arg(0)) else {
            return "mkdir: missing operand".to_string();
        };
        let raw = inv.arg(0).unwrap_or(arg);
        let target = shell.resolve(arg);
        let exists = format!("mkdir: cannot create directory '{}': File exists", raw);
        if shell.node(&target).is_some() {
            return exists;
        }
        match inv.backend.create(NewNode::directory(&target)).await {
            Ok(node) => {
                shell.tree().write().insert(node);
                String::new()
            }
            Err(BackendError::PathExists(_)) => exists,
            Err(err) => shell.backend_failure(
                "mkdir",
                &inv.backend,
                &err,
                format!("mkdir: error creating directory '{}'", raw),
            ),
        }
    })
}

/// Delete nodes deepest first; stops at the first failure and reports which
/// paths were actually removed.
async fn delete_all(inv: &Invocation, mut doomed: Vec<FileNode>) -> (Vec<String>, Option<BackendError>) {
    doomed.sort_by(|a, b| depth(b).cmp(&depth(a)).then_with(|| a.path.cmp(&b.path)));
    let mut removed = Vec::with_capacity(doomed.len());
    for node in doomed {
        if inv.backend.addresses(&node) {
            match inv.backend.delete(&node).await {
                Ok(()) | Err(BackendError::MissingPath(_)) | Err(BackendError::NotFound(_)) => {}
                Err(err) => return (removed, Some(err)),
            }
        } else {
            debug!(path = %node.path, "node was never persisted; removing locally only");
        }
        removed.push(node.path);
    }
    (removed, None)
}

pub(super) fn rm<'a>(shell: &'a mut Shell, inv: &'a Invocation) -> BoxFuture<'a, String> {
    Box::pin(async move {
        let flags = flag_chars(&inv.args);
        let recursive = flags.contains(&'r') || flags.contains(&'R');
        let force = flags.contains(&'f');
        let raw = parse::positionals(&inv.args).first().copied();
        let Some(arg) = parse::operand(raw) else {
            return "rm: missing operand".to_string();
        };
        let raw = raw.unwrap_or(arg);
        let target = shell.resolve(arg);

        let Some(node) = shell.node(&target) else {
            return if force {
                String::new()
            } else {
                format!("rm: cannot remove '{}': No such file or directory", raw)
            };
        };
        if node.is_dir() {
            if !recursive {
                return format!(
                    "rm: cannot remove '{}': Is a directory (use -r for directories)",
                    raw
                );
            }
            if shell.tree().read().has_children(&target) && !force {
                return format!(
                    "rm: cannot remove '{}': Directory not empty (use -rf to force)",
                    raw
                );
            }
        }

        let doomed = subtree(shell, &node);
        let (removed, failure) = delete_all(inv, doomed).await;
        match failure {
            None => {
                shell.tree().write().remove_subtree(&target);
                String::new()
            }
            Some(err) => {
                let mut tree = shell.tree().write();
                for removed_path in &removed {
                    tree.remove(removed_path);
                }
                drop(tree);
                shell.backend_failure(
                    "rm",
                    &inv.backend,
                    &err,
                    format!("rm: error removing '{}'", raw),
                )
            }
        }
    })
}

pub(super) fn rmdir<'a>(shell: &'a mut Shell, inv: &'a Invocation) -> BoxFuture<'a, String> {
    Box::pin(async move {
        let Some(arg) = parse::operand(inv.arg(0)) else {
            return "rmdir: missing operand".to_string();
        };
        let raw = inv.arg(0).unwrap_or(arg);
        let target = shell.resolve(arg);
        let Some(node) = shell.node(&target) else {
            return format!("rmdir: failed to remove '{}': No such file or directory", raw);
        };
        if !node.is_dir() {
            return format!("rmdir: failed to remove '{}': Not a directory", raw);
        }
        if shell.tree().read().has_children(&target) {
            return format!("rmdir: failed to remove '{}': Directory not empty", raw);
        }

        match delete_all(inv, vec![node]).await {
            (_, None) => {
                shell.tree().write().remove(&target);
                String::new()
            }
            (_, Some(err)) => shell.backend_failure(
                "rmdir",
                &inv.backend,
                &err,
                format!("rmdir: error removing '{}'", raw),
            ),
        }
    })
}

pub(super) fn mv<'a>(shell: &'a mut Shell, inv: &'a Invocation) -> BoxFuture<'a, String> {
    Box::pin(async move {
        let operands = parse::positionals(&inv.args);
        let (Some(src_raw), Some(dest_raw)) = (operands.first().copied(), operands.get(1).copied()) else {
            return "mv: missing file operand".to_string();
        };
        let (Some(src_arg), Some(dest_arg)) = (parse::operand(Some(src_raw)), parse::operand(Some(dest_raw))) else {
            return "mv: missing file operand".to_string();
        };

        let source_path = shell.resolve(src_arg);
        let Some(source) = shell.node(&source_path) else {
            return format!("mv: cannot stat '{}': No such file or directory", src_raw);
        };
        let dest_path = destination(shell, &source, dest_arg);
        if dest_path == source_path {
            return String::new();
        }
        if path::is_within(&dest_path, &source_path) {
            return format!(
                "mv: cannot move '{}' to a subdirectory of itself, '{}'",
                src_raw, dest_raw
            );
        }
        if shell.node(&dest_path).is_some() {
            return format!("mv: cannot move '{}' to '{}': File exists", src_raw, dest_raw);
        }

        let moving = subtree(shell, &source);
        for node in &moving {
            if !inv.backend.addresses(node) {
                continue;
            }
            let Some(new_path) = path::rebase(&node.path, &source_path, &dest_path) else {
                continue;
            };
            if let Err(err) = inv.backend.update(node, NodePatch::relocate(&new_path)).await {
                return shell.backend_failure(
                    "mv",
                    &inv.backend,
                    &err,
                    format!("mv: error moving '{}'", src_raw),
                );
            }
        }

        shell.tree().write().rebase_subtree(&source_path, &dest_path);
        if path::is_within(shell.cwd(), &source_path) {
            if let Some(cwd) = path::rebase(shell.cwd(), &source_path, &dest_path) {
                shell.set_cwd(cwd);
            }
        }
        String::new()
    })
}

pub(super) fn cp<'a>(shell: &'a mut Shell, inv: &'a Invocation) -> BoxFuture<'a, String> {
    Box::pin(async move {
        let flags = flag_chars(&inv.args);
        let recursive = flags.contains(&'r') || flags.contains(&'R');
        let operands = parse::positionals(&inv.args);
        let (Some(src_raw), Some(dest_raw)) = (operands.first().copied(), operands.get(1).copied()) else {
            return "cp: missing file operand".to_string();
        };
        let (Some(src_arg), Some(dest_arg)) = (parse::operand(Some(src_raw)), parse::operand(Some(dest_raw))) else {
            return "cp: missing file operand".to_string();
        };

        let source_path = shell.resolve(src_arg);
        let Some(source) = shell.node(&source_path) else {
            return format!("cp: cannot stat '{}': No such file or directory", src_raw);
        };
        if source.is_dir() && !recursive {
            return format!("cp: -r not specified; omitting directory '{}'", src_raw);
        }
        let dest_path = destination(shell, &source, dest_arg);
        if dest_path == source_path {
            return format!("cp: '{}' and '{}' are the same file", src_raw, dest_raw);
        }
        if path::is_within(&dest_path, &source_path) {
            return format!(
                "cp: cannot copy a directory, '{}', into itself, '{}'",
                src_raw, dest_raw
            );
        }
        if shell.node(&dest_path).is_some() {
            return format!("cp: cannot create '{}': File exists", dest_raw);
        }

        // Parents before children; descendants_of is breadth first
        let copying = subtree(shell, &source);
        for node in &copying {
            let Some(new_path) = path::rebase(&node.path, &source_path, &dest_path) else {
                continue;
            };
            match inv.backend.create(NewNode::copy_of(node, &new_path)).await {
                Ok(created) => {
                    shell.tree().write().insert(created);
                }
                Err(err) => {
                    return shell.backend_failure(
                        "cp",
                        &inv.backend,
                        &err,
                        format!("cp: error copying '{}'", src_raw),
                    )
                }
            }
        }
        String::new()
    })
}

pub(super) fn nano(shell: &mut Shell, inv: &Invocation) -> String {
    let Some(arg) = parse::operand(inv.arg(0)) else {
        return "nano: missing file operand".to_string();
    };
    let raw = inv.arg(0).unwrap_or(arg);
    let target = shell.resolve(arg);
    let content = match shell.node(&target) {
        Some(node) if node.is_dir() => return format!("nano: {}: Is a directory", raw),
        Some(node) => node.content.unwrap_or_default(),
        None => String::new(),
    };
    shell.editor_mut().open(&target, &content);
    String::new()
}
