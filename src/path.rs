//! Path resolution for the virtual tree.
//!
//! Paths are plain `/`-separated strings rather than `std::path::Path`: the
//! tree is virtual and must behave identically on every host platform.
//! Resolution never fails; existence checks belong to the caller.

/// Home directory used for `~` and for `cd` without arguments
pub const DEFAULT_HOME: &str = "/home";

/// Root path
pub const ROOT: &str = "/";

/// Resolve `raw` against `cwd` using the default home directory.
pub fn resolve(raw: &str, cwd: &str) -> String {
    resolve_with_home(raw, cwd, DEFAULT_HOME)
}

/// Resolve `raw` against `cwd` into a canonical absolute path.
///
/// `~` expands to `home`; absolute inputs restart from the root; `..` pops a
/// segment (a no-op at the root) and `.` is ignored. The result has a single
/// leading slash and no trailing slash, except for the root itself.
/// Absolute inputs go through the same normalization, so `/a/./b/` comes
/// back as `/a/b`.
pub fn resolve_with_home(raw: &str, cwd: &str, home: &str) -> String {
    let expanded;
    let raw = match raw.strip_prefix('~') {
        Some(rest) => {
            expanded = format!("{}/{}", home.trim_end_matches('/'), rest.trim_start_matches('/'));
            expanded.as_str()
        }
        None => raw,
    };

    let mut segments: Vec<&str> = if raw.starts_with('/') {
        Vec::new()
    } else {
        cwd.split('/').filter(|s| !s.is_empty()).collect()
    };

    for part in raw.split('/').filter(|s| !s.is_empty()) {
        match part {
            ".." => {
                segments.pop();
            }
            "." => {}
            other => segments.push(other),
        }
    }

    join(&segments)
}

fn join(segments: &[&str]) -> String {
    let mut out = String::with_capacity(segments.iter().map(|s| s.len() + 1).sum::<usize>().max(1));
    for segment in segments {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Strip one pair of matching single or double quotes from a command argument.
pub fn strip_quotes(arg: &str) -> &str {
    let trimmed = arg.trim();
    if trimmed.len() >= 2 {
        let bytes = trimmed.as_bytes();
        let (first, last) = (bytes[0], bytes[trimmed.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

/// Parent of a canonical path; the root is its own parent.
pub fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => ROOT,
        Some(idx) => &path[..idx],
    }
}

/// Final segment of a canonical path; empty for the root.
pub fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Join a child name onto a directory path.
pub fn child_path(dir: &str, name: &str) -> String {
    if dir == ROOT {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// True when `path` is `ancestor` or lies beneath it.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    if ancestor == ROOT {
        return path.starts_with('/');
    }
    path == ancestor
        || (path.starts_with(ancestor) && path.as_bytes().get(ancestor.len()) == Some(&b'/'))
}

/// Substitute the `from` prefix of `path` with `to`.
///
/// Returns `None` when `path` is not within `from`.
pub fn rebase(path: &str, from: &str, to: &str) -> Option<String> {
    if path == from {
        return Some(to.to_string());
    }
    if from == ROOT || !is_within(path, from) {
        return None;
    }
    Some(format!("{}{}", to, &path[from.len()..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn relative_path_joins_cwd() {
        assert_eq!(resolve("notes/a.txt", "/home"), "/home/notes/a.txt");
    }

    #[test]
    fn parent_segment_pops_and_stops_at_root() {
        assert_eq!(resolve("..", "/home/notes"), "/home");
        assert_eq!(resolve("..", "/"), "/");
        assert_eq!(resolve("../../..", "/home"), "/");
    }

    #[test]
    fn current_segment_is_ignored() {
        assert_eq!(resolve("./a/./b", "/home"), "/home/a/b");
        assert_eq!(resolve(".", "/home"), "/home");
    }

    #[test]
    fn tilde_expands_to_home() {
        assert_eq!(resolve("~", "/tmp"), "/home");
        assert_eq!(resolve("~/notes", "/tmp"), "/home/notes");
        assert_eq!(resolve_with_home("~/x", "/", "/users/me"), "/users/me/x");
    }

    #[test]
    fn absolute_path_is_canonicalized() {
        assert_eq!(resolve("/home/notes/", "/tmp"), "/home/notes");
        assert_eq!(resolve("/", "/home"), "/");
        assert_eq!(resolve("//home//a", "/"), "/home/a");
    }

    #[test]
    fn strip_quotes_handles_matching_pairs_only() {
        assert_eq!(strip_quotes("\"a b\""), "a b");
        assert_eq!(strip_quotes("'x.txt'"), "x.txt");
        assert_eq!(strip_quotes("\"x.txt'"), "\"x.txt'");
        assert_eq!(strip_quotes("\""), "\"");
    }

    #[test]
    fn parent_and_basename() {
        assert_eq!(parent_of("/home/a.txt"), "/home");
        assert_eq!(parent_of("/home"), "/");
        assert_eq!(parent_of("/"), "/");
        assert_eq!(basename("/home/a.txt"), "a.txt");
        assert_eq!(basename("/"), "");
    }

    #[test]
    fn rebase_substitutes_prefix_only_on_segment_boundary() {
        assert_eq!(rebase("/home/foo/x.txt", "/home/foo", "/home/baz").as_deref(), Some("/home/baz/x.txt"));
        assert_eq!(rebase("/home/foo", "/home/foo", "/home/baz").as_deref(), Some("/home/baz"));
        assert_eq!(rebase("/home/foobar", "/home/foo", "/home/baz"), None);
    }

    proptest! {
        #[test]
        fn plain_relative_paths_append_to_cwd(
            cwd in prop::collection::vec("[a-z]{1,6}", 0..4),
            rel in prop::collection::vec("[a-zA-Z0-9_]{1,6}(\\.txt)?", 1..4),
        ) {
            let cwd_path = join(&cwd.iter().map(String::as_str).collect::<Vec<_>>());
            let input = rel.join("/");
            let resolved = resolve(&input, &cwd_path);
            let expected = if cwd_path == "/" { format!("/{}", input) } else { format!("{}/{}", cwd_path, input) };
            prop_assert_eq!(resolved, expected);
        }

        #[test]
        fn resolved_paths_are_canonical(raw in "[a-z./~]{0,16}", cwd in "(/[a-z]{1,4}){0,3}") {
            let cwd = if cwd.is_empty() { "/".to_string() } else { cwd };
            let resolved = resolve(&raw, &cwd);
            prop_assert!(resolved.starts_with('/'));
            prop_assert!(resolved == "/" || !resolved.ends_with('/'));
            prop_assert!(!resolved.contains("//"));
            prop_assert!(!resolved.split('/').any(|s| s == "." || s == ".."));
        }
    }
}
