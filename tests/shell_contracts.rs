//! Command interpreter behaviour over a local store.

mod support;

use deskvfs::backend::FileBackend;
use deskvfs::path;
use deskvfs::types::NodeKind;
use support::{run, TestDesktop};

#[tokio::test]
async fn nested_mkdir_lists_one_child() {
    let env = TestDesktop::new();
    let mut shell = env.shell().await;
    run(&mut shell, &["mkdir foo", "mkdir foo/bar"]).await;

    let tree = env.desktop.tree().read();
    let children = tree.children_of("/home/foo");
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].name, "bar");
    assert_eq!(children[0].kind, NodeKind::Directory);
}

#[tokio::test]
async fn mkdir_twice_reports_file_exists() {
    let env = TestDesktop::new();
    let mut shell = env.shell().await;
    assert_eq!(shell.submit("mkdir foo").await, "");
    let second = shell.submit("mkdir foo").await;
    assert!(second.contains("File exists"), "{}", second);

    let stored = env.desktop.selector().local().list().await.unwrap();
    assert_eq!(stored.iter().filter(|n| n.path == "/home/foo").count(), 1);
}

#[tokio::test]
async fn rm_needs_recursive_flag_for_directories() {
    let env = TestDesktop::new();
    let mut shell = env.shell().await;
    run(&mut shell, &["mkdir docs", "touch docs/a.txt"]).await;
    let before = env.desktop.tree().read().len();

    let output = shell.submit("rm docs").await;
    assert!(output.contains("Is a directory"), "{}", output);
    assert_eq!(env.desktop.tree().read().len(), before);
    assert!(env.exists("/home/docs/a.txt"));
}

#[tokio::test]
async fn rm_r_refuses_non_empty_directory_without_force() {
    let env = TestDesktop::new();
    let mut shell = env.shell().await;
    let output = run(&mut shell, &["mkdir docs", "touch docs/a.txt", "rm -r docs"]).await;
    assert!(output.contains("Directory not empty"), "{}", output);
    assert!(env.exists("/home/docs"));
}

#[tokio::test]
async fn rm_rf_removes_the_whole_subtree() {
    let env = TestDesktop::new();
    let mut shell = env.shell().await;
    run(
        &mut shell,
        &["mkdir proj", "mkdir proj/src", "touch proj/src/main.rs", "touch proj/README"],
    )
    .await;

    assert_eq!(shell.submit("rm -rf proj").await, "");
    assert!(!env.exists("/home/proj"));
    assert!(env.child_names("/home/proj").is_empty());
    assert!(!env.exists("/home/proj/src/main.rs"));

    let stored = env.desktop.selector().local().list().await.unwrap();
    assert!(stored.iter().all(|n| !path::is_within(&n.path, "/home/proj")));
    assert!(stored.iter().any(|n| n.path == "/home/projects"));
}

#[tokio::test]
async fn rm_force_ignores_missing_targets() {
    let env = TestDesktop::new();
    let mut shell = env.shell().await;
    assert_eq!(shell.submit("rm -f ghost").await, "");
    let output = shell.submit("rm ghost").await;
    assert_eq!(output, "rm: cannot remove 'ghost': No such file or directory");
}

#[tokio::test]
async fn mv_rebases_descendants() {
    let env = TestDesktop::new();
    let mut shell = env.shell().await;
    run(&mut shell, &["mkdir foo", "touch foo/x.txt"]).await;

    assert_eq!(shell.submit("mv /home/foo /home/baz").await, "");
    assert!(env.exists("/home/baz"));
    assert!(env.exists("/home/baz/x.txt"));
    assert!(!env.exists("/home/foo"));
    assert!(!env.exists("/home/foo/x.txt"));
    assert_eq!(shell.submit("cat foo/x.txt").await, "cat: foo/x.txt: No such file or directory");
}

#[tokio::test]
async fn mv_into_existing_directory_keeps_the_name() {
    let env = TestDesktop::new();
    let mut shell = env.shell().await;
    run(&mut shell, &["touch a.txt", "mv a.txt documents"]).await;
    assert!(env.exists("/home/documents/a.txt"));
    assert!(!env.exists("/home/a.txt"));
}

#[tokio::test]
async fn mv_follows_the_working_directory() {
    let env = TestDesktop::new();
    let mut shell = env.shell().await;
    run(&mut shell, &["mkdir old", "cd old", "mv /home/old /home/new"]).await;
    assert_eq!(shell.cwd(), "/home/new");
}

#[tokio::test]
async fn mv_refuses_to_move_into_itself() {
    let env = TestDesktop::new();
    let mut shell = env.shell().await;
    let output = run(&mut shell, &["mkdir a", "mv a a/b"]).await;
    assert!(output.contains("subdirectory of itself"), "{}", output);
    assert!(env.exists("/home/a"));
}

#[tokio::test]
async fn cp_copies_each_descendant() {
    let env = TestDesktop::new();
    let mut shell = env.shell().await;
    run(&mut shell, &["mkdir src", "touch src/a.txt", "mkdir src/lib"]).await;

    let refused = shell.submit("cp src dst").await;
    assert!(refused.contains("-r not specified"), "{}", refused);

    assert_eq!(shell.submit("cp -r src dst").await, "");
    assert!(env.exists("/home/src/a.txt"));
    assert!(env.exists("/home/dst/a.txt"));
    assert!(env.exists("/home/dst/lib"));

    let stored = env.desktop.selector().local().list().await.unwrap();
    assert!(stored.iter().any(|n| n.path == "/home/dst/a.txt"));
}

#[tokio::test]
async fn cp_onto_itself_is_the_same_file() {
    let env = TestDesktop::new();
    let mut shell = env.shell().await;
    let output = run(&mut shell, &["touch a.txt", "cp a.txt a.txt"]).await;
    assert_eq!(output, "cp: 'a.txt' and 'a.txt' are the same file");

    let stored = env.desktop.selector().local().list().await.unwrap();
    assert_eq!(stored.iter().filter(|n| n.path == "/home/a.txt").count(), 1);
}

#[tokio::test]
async fn touch_cat_and_nano_round_trip() {
    let env = TestDesktop::new();
    let mut shell = env.shell().await;
    shell.submit("touch a.txt").await;
    assert_eq!(shell.submit("cat a.txt").await, "(empty file)");

    shell.submit("nano a.txt").await;
    assert!(shell.is_editing());
    shell.editor_mut().set_buffer("hi");
    assert_eq!(shell.save_edit().await, "File saved: /home/a.txt");
    assert!(shell.is_editing());
    shell.exit_edit();

    assert_eq!(shell.submit("cat a.txt").await, "hi");
}

#[tokio::test]
async fn nano_exit_discards_the_buffer() {
    let env = TestDesktop::new();
    let mut shell = env.shell().await;
    shell.submit("nano scratch.txt").await;
    shell.editor_mut().set_buffer("never saved");
    shell.exit_edit();
    assert!(!env.exists("/home/scratch.txt"));
    assert_eq!(
        shell.submit("cat scratch.txt").await,
        "cat: scratch.txt: No such file or directory"
    );
}

#[tokio::test]
async fn ls_puts_directories_first() {
    let env = TestDesktop::new();
    let mut shell = env.shell().await;
    let output = run(
        &mut shell,
        &["mkdir box", "cd box", "touch zeta", "mkdir Alpha", "touch beta", "ls"],
    )
    .await;
    assert_eq!(output, "Alpha/  beta  zeta");
}

#[tokio::test]
async fn ls_hides_dotfiles_unless_asked() {
    let env = TestDesktop::new();
    let mut shell = env.shell().await;
    run(&mut shell, &["mkdir d", "touch d/.hidden", "touch d/shown"]).await;
    assert_eq!(shell.submit("ls d").await, "shown");
    assert_eq!(shell.submit("ls -a d").await, ".hidden  shown");
    assert_eq!(shell.submit("ls d/shown").await, "shown");
}

#[tokio::test]
async fn cd_checks_the_target() {
    let env = TestDesktop::new();
    let mut shell = env.shell().await;
    assert_eq!(shell.submit("cd welcome.txt").await, "cd: not a directory: welcome.txt");
    assert_eq!(shell.submit("cd nowhere").await, "cd: no such file or directory: nowhere");
    assert_eq!(shell.submit("cd ..").await, "");
    assert_eq!(shell.cwd(), "/");
    assert_eq!(shell.submit("cd ..").await, "");
    assert_eq!(shell.cwd(), "/");
    shell.submit("cd").await;
    assert_eq!(shell.cwd(), "/home");
}

#[tokio::test]
async fn quoted_arguments_are_stripped() {
    let env = TestDesktop::new();
    let mut shell = env.shell().await;
    shell.submit("touch \"quoted.txt\"").await;
    assert!(env.exists("/home/quoted.txt"));
    assert_eq!(shell.submit("cat 'quoted.txt'").await, "(empty file)");
}

#[tokio::test]
async fn reading_verbs_distinguish_errors() {
    let env = TestDesktop::new();
    let mut shell = env.shell().await;
    assert_eq!(shell.submit("cat").await, "cat: missing file operand");
    assert_eq!(shell.submit("cat nope").await, "cat: nope: No such file or directory");
    assert_eq!(shell.submit("cat documents").await, "cat: documents: Is a directory");
}

#[tokio::test]
async fn search_verbs() {
    let env = TestDesktop::new();
    let mut shell = env.shell().await;
    shell.submit("nano log.txt").await;
    shell.editor_mut().set_buffer("Alpha\nbeta\nALPHA again");
    shell.save_edit().await;
    shell.exit_edit();

    assert_eq!(shell.submit("grep alpha log.txt").await, "1:Alpha\n3:ALPHA again");
    assert_eq!(shell.submit("head -n 1 log.txt").await, "Alpha");
    assert_eq!(shell.submit("tail -n 2 log.txt").await, "beta\nALPHA again");
    assert_eq!(shell.submit("wc log.txt").await, "  3  4  22 log.txt");

    let found = shell.submit("find . -name *.txt").await;
    assert!(found.lines().any(|l| l == "/home/log.txt"), "{}", found);
    assert!(found.lines().all(|l| l.ends_with(".txt")), "{}", found);
}

#[tokio::test]
async fn unknown_verbs_are_not_fatal() {
    let env = TestDesktop::new();
    let mut shell = env.shell().await;
    let output = shell.submit("frobnicate now").await;
    assert!(output.starts_with("frobnicate: command not found"));
    assert_eq!(shell.submit("pwd").await, "/home");
}

#[tokio::test]
async fn history_survives_a_new_terminal() {
    let env = TestDesktop::new();
    let mut shell = env.shell().await;
    run(&mut shell, &["pwd", "ls"]).await;

    let mut reopened = env.bare_shell();
    reopened.load_history().await;
    assert_eq!(reopened.history(), ["pwd", "ls"]);
    assert_eq!(reopened.submit("history").await, "  1  pwd\n  2  ls\n  3  history");
}
