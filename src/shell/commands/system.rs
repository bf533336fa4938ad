use super::help_text;
use crate::shell::{Invocation, Shell};

pub(super) fn help(_shell: &mut Shell, _inv: &Invocation) -> String {
    help_text("  Notes: files in ~/notes/ are shared with the Notes surface")
}

pub(super) fn clear(shell: &mut Shell, _inv: &Invocation) -> String {
    shell.clear_transcript();
    String::new()
}

pub(super) fn echo(_shell: &mut Shell, inv: &Invocation) -> String {
    inv.args.join(" ")
}

pub(super) fn about(shell: &mut Shell, _inv: &Invocation) -> String {
    let storage = if shell.selector().sessions().scope().is_authenticated() {
        "Cloud-synced file system"
    } else {
        "Local file system (playground mode)"
    };
    format!(
        "Desktop v{}\nA virtual operating system experience\n{}",
        env!("CARGO_PKG_VERSION"),
        storage
    )
}

pub(super) fn date(_shell: &mut Shell, _inv: &Invocation) -> String {
    chrono::Local::now().format("%a %b %d %Y %H:%M:%S GMT%z").to_string()
}

pub(super) fn whoami(shell: &mut Shell, _inv: &Invocation) -> String {
    shell
        .selector()
        .sessions()
        .current()
        .and_then(|s| s.email.or(s.user_id))
        .unwrap_or_else(|| "guest@desktop".to_string())
}

pub(super) fn history(shell: &mut Shell, _inv: &Invocation) -> String {
    let lines = shell.history();
    let width = lines.len().to_string().len();
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("  {:>width$}  {}", i + 1, line, width = width))
        .collect::<Vec<_>>()
        .join("\n")
}
