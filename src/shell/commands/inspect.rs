use crate::shell::parse::{self, count_or, take_option};
use crate::shell::{Invocation, Shell};
use crate::tree::TreeStore;
use crate::types::FileNode;

const EMPTY_FILE: &str = "(empty file)";
const DEFAULT_LINES: usize = 10;

/// Look up a regular file for a reading verb, or the verb's error line.
fn open_file(shell: &Shell, verb: &str, raw: Option<&str>) -> Result<FileNode, String> {
    let Some(arg) = parse::operand(raw) else {
        return Err(format!("{}: missing file operand", verb));
    };
    let raw = raw.unwrap_or(arg);
    match shell.node(&shell.resolve(arg)) {
        None => Err(format!("{}: {}: No such file or directory", verb, raw)),
        Some(node) if node.is_dir() => Err(format!("{}: {}: Is a directory", verb, raw)),
        Some(node) => Ok(node),
    }
}

pub(super) fn cat(shell: &mut Shell, inv: &Invocation) -> String {
    let numbered = inv.args.iter().any(|a| a == "-n");
    let raw = inv.args.iter().map(String::as_str).find(|a| *a != "-n");
    let node = match open_file(shell, "cat", raw) {
        Ok(node) => node,
        Err(message) => return message,
    };
    let content = node.text();
    if content.is_empty() {
        return EMPTY_FILE.to_string();
    }
    if !numbered {
        return content.to_string();
    }
    content
        .split('\n')
        .enumerate()
        .map(|(i, line)| format!("{}  {}", i + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Line count and file for `head`/`tail`
fn line_window(shell: &Shell, verb: &str, args: &[String]) -> Result<(usize, FileNode), String> {
    let (count, rest) = take_option(args, "-n");
    let lines = count_or(count, DEFAULT_LINES);
    let node = open_file(shell, verb, rest.into_iter().next())?;
    Ok((lines, node))
}

pub(super) fn head(shell: &mut Shell, inv: &Invocation) -> String {
    match line_window(shell, "head", &inv.args) {
        Ok((_, node)) if node.text().is_empty() => EMPTY_FILE.to_string(),
        Ok((n, node)) => node.text().split('\n').take(n).collect::<Vec<_>>().join("\n"),
        Err(message) => message,
    }
}

pub(super) fn tail(shell: &mut Shell, inv: &Invocation) -> String {
    match line_window(shell, "tail", &inv.args) {
        Ok((_, node)) if node.text().is_empty() => EMPTY_FILE.to_string(),
        Ok((n, node)) => {
            let lines: Vec<&str> = node.text().split('\n').collect();
            lines[lines.len().saturating_sub(n)..].join("\n")
        }
        Err(message) => message,
    }
}

pub(super) fn wc(shell: &mut Shell, inv: &Invocation) -> String {
    match open_file(shell, "wc", inv.arg(0)) {
        Ok(node) => {
            let content = node.text();
            format!(
                "  {}  {}  {} {}",
                content.split('\n').count(),
                content.split_whitespace().count(),
                content.len(),
                node.name
            )
        }
        Err(message) => message,
    }
}

/// `*` matches everything, `*.ext` matches a suffix, anything else is substring containment.
fn name_matches(name: &str, pattern: &str) -> bool {
    if pattern == "*" || name.contains(pattern) {
        return true;
    }
    match pattern.strip_prefix('*') {
        Some(suffix) if suffix.starts_with('.') => name.ends_with(suffix),
        _ => false,
    }
}

fn collect_matches(tree: &TreeStore, dir: &str, pattern: &str, out: &mut Vec<String>) {
    for child in tree.listing(dir) {
        if name_matches(&child.name, pattern) {
            out.push(child.path.clone());
        }
        if child.is_dir() {
            collect_matches(tree, &child.path, pattern, out);
        }
    }
}

pub(super) fn find(shell: &mut Shell, inv: &Invocation) -> String {
    let (pattern, rest) = take_option(&inv.args, "-name");
    let pattern = parse::operand(pattern).unwrap_or("*");
    let raw = rest.into_iter().find(|a| !parse::is_flag(a));
    let start = shell.resolve(parse::operand(raw).unwrap_or("."));

    let tree = shell.tree().read();
    if tree.get(&start).is_none() && !tree.has_children(&start) && start != shell.home() {
        return format!(
            "find: '{}': No such file or directory",
            raw.unwrap_or(&start)
        );
    }
    let mut matches = Vec::new();
    collect_matches(&tree, &start, pattern, &mut matches);
    matches.join("\n")
}

pub(super) fn grep(shell: &mut Shell, inv: &Invocation) -> String {
    let Some(pattern) = parse::operand(inv.arg(0)) else {
        return "grep: missing search pattern".to_string();
    };
    let node = match open_file(shell, "grep", inv.arg(1)) {
        Ok(node) => node,
        Err(message) => return message,
    };
    let needle = pattern.to_lowercase();
    node.text()
        .split('\n')
        .enumerate()
        .filter(|(_, line)| line.to_lowercase().contains(&needle))
        .map(|(i, line)| format!("{}:{}", i + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::name_matches;

    #[test]
    fn find_patterns() {
        assert!(name_matches("notes.txt", "*"));
        assert!(name_matches("notes.txt", "note"));
        assert!(name_matches("notes.txt", "*.txt"));
        assert!(!name_matches("notes.md", "*.txt"));
        assert!(!name_matches("notes.txt", "*txt"));
    }
}
