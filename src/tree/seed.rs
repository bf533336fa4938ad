//! Default tree created for an owner whose store is empty.

use crate::types::NewNode;

const WELCOME: &str = "Welcome to the desktop!\n\n\
This is a virtual file system.\n\
Try these commands:\n\
- ls (list files)\n\
- mkdir foldername (create folder)\n\
- touch filename.txt (create file)\n\
- cat filename.txt (read file)\n\
- nano filename.txt (edit file)\n\
- cd foldername (change directory)\n\
- find . -name pattern (search files)\n\
- grep pattern file (search in file)\n\n\
Have fun exploring!";

const README: &str = "Desktop - README\n\n\
Features:\n\
- Virtual file system\n\
- Cloud sync (when signed in)\n\
- Terminal commands\n\
- Notes integration (~/notes/)\n\n\
Commands:\n\
help, ls, cd, cat, mkdir, touch, rm, rmdir, mv, cp, nano, find, grep, pwd, \
whoami, date, about, clear, echo, tree, head, tail, wc, history";

/// Nodes to seed, parents before children
pub fn default_nodes(home: &str, notes_dir: &str) -> Vec<NewNode> {
    let at = |rel: &str| format!("{}/{}", home.trim_end_matches('/'), rel);
    vec![
        NewNode::directory(home),
        NewNode::directory(notes_dir),
        NewNode::file(&format!("{}/default.txt", notes_dir.trim_end_matches('/')), ""),
        NewNode::file(&at("welcome.txt"), WELCOME),
        NewNode::file(&at("readme.txt"), README),
        NewNode::directory(&at("documents")),
        NewNode::directory(&at("projects")),
    ]
}
