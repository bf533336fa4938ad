//! Deskvfs: virtual file system and shell for a browser desktop
//!
//! A path-addressed tree of files and directories, a Unix-like command
//! interpreter over it, and persistence that switches between a remote REST
//! store (when signed in) and an on-device sled store (when not). Surfaces
//! such as the terminal and the notes view share one tree and converge by
//! polling.

pub mod backend;
pub mod cli;
pub mod concurrency;
pub mod config;
pub mod desktop;
pub mod editor;
pub mod error;
pub mod logging;
pub mod notes;
pub mod path;
pub mod session;
pub mod shell;
pub mod sync;
pub mod tree;
pub mod types;
