use crate::path;
use crate::shell::parse::{self, count_or, flag_chars, take_option};
use crate::shell::{Invocation, Shell};
use crate::tree::TreeStore;
use crate::types::FileNode;

const DEFAULT_TREE_DEPTH: usize = 3;

pub(super) fn pwd(shell: &mut Shell, _inv: &Invocation) -> String {
    shell.cwd().to_string()
}

fn display_name(node: &FileNode) -> String {
    if node.is_dir() {
        format!("{}/", node.name)
    } else {
        node.name.clone()
    }
}

/// A path with no node of its own is still a directory if something lives under it.
fn exists_as_dir(tree: &TreeStore, target: &str, home: &str) -> bool {
    match tree.get(target) {
        Some(node) => node.is_dir(),
        None => tree.has_children(target) || target == home,
    }
}

pub(super) fn ls(shell: &mut Shell, inv: &Invocation) -> String {
    let flags = flag_chars(&inv.args);
    let long = flags.contains(&'l');
    let all = flags.contains(&'a');
    let raw = parse::positionals(&inv.args).first().copied();
    let target = match parse::operand(raw) {
        Some(arg) => shell.resolve(arg),
        None => shell.cwd().to_string(),
    };

    let tree = shell.tree().read();
    if let Some(node) = tree.get(&target) {
        if !node.is_dir() {
            return node.name.clone();
        }
    } else if !exists_as_dir(&tree, &target, shell.home()) {
        return format!(
            "ls: cannot access '{}': No such file or directory",
            raw.unwrap_or(&target)
        );
    }

    let entries: Vec<&FileNode> = tree
        .listing(&target)
        .into_iter()
        .filter(|n| all || !n.name.starts_with('.'))
        .collect();

    if long {
        entries
            .iter()
            .map(|n| {
                format!(
                    "{}rwxr-xr-x  1 user  user  {:>8} {}",
                    if n.is_dir() { 'd' } else { '-' },
                    n.text().len(),
                    display_name(n)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        entries
            .iter()
            .map(|n| display_name(n))
            .collect::<Vec<_>>()
            .join("  ")
    }
}

pub(super) fn cd(shell: &mut Shell, inv: &Invocation) -> String {
    let Some(arg) = parse::operand(inv.arg(0)) else {
        let home = shell.home().to_string();
        shell.set_cwd(home);
        return String::new();
    };
    let raw = inv.arg(0).unwrap_or(arg);
    let target = shell.resolve(arg);

    let verdict = {
        let tree = shell.tree().read();
        match tree.get(&target) {
            Some(node) if !node.is_dir() => Err(format!("cd: not a directory: {}", raw)),
            Some(_) => Ok(()),
            None if exists_as_dir(&tree, &target, shell.home()) => Ok(()),
            None => Err(format!("cd: no such file or directory: {}", raw)),
        }
    };
    match verdict {
        Ok(()) => {
            shell.set_cwd(target);
            String::new()
        }
        Err(message) => message,
    }
}

pub(super) fn tree(shell: &mut Shell, inv: &Invocation) -> String {
    let (level, rest) = take_option(&inv.args, "-L");
    let depth = count_or(level, DEFAULT_TREE_DEPTH);
    let raw = rest.into_iter().find(|a| !parse::is_flag(a));
    let target = match parse::operand(raw) {
        Some(arg) => shell.resolve(arg),
        None => shell.cwd().to_string(),
    };

    let tree = shell.tree().read();
    let header = match tree.get(&target) {
        Some(node) if !node.is_dir() => return node.name.clone(),
        Some(node) => format!("{}/", node.name),
        None if exists_as_dir(&tree, &target, shell.home()) => {
            if target == path::ROOT {
                path::ROOT.to_string()
            } else {
                format!("{}/", path::basename(&target))
            }
        }
        None => {
            return format!(
                "tree: '{}': No such file or directory",
                raw.unwrap_or(&target)
            )
        }
    };

    let mut lines = vec![header];
    draw(&tree, &target, "", 0, depth, &mut lines);
    lines.join("\n")
}

fn draw(tree: &TreeStore, dir: &str, prefix: &str, level: usize, max: usize, lines: &mut Vec<String>) {
    if level >= max {
        return;
    }
    let children = tree.listing(dir);
    let count = children.len();
    for (index, child) in children.into_iter().enumerate() {
        let last = index + 1 == count;
        let connector = if last { "└── " } else { "├── " };
        lines.push(format!("{}{}{}", prefix, connector, display_name(child)));
        if child.is_dir() {
            let nested = format!("{}{}", prefix, if last { "    " } else { "│   " });
            draw(tree, &child.path, &nested, level + 1, max, lines);
        }
    }
}
