//! CLI Tooling
//!
//! Command-line front end for the desktop file system: an interactive
//! terminal, one-shot command execution and a notes view.

use crate::config::{AppConfig, ConfigLoader};
use crate::desktop::Desktop;
use crate::error::{ApiError, BackendError};
use crate::notes::NotesSurface;
use crate::path;
use crate::session::Session;
use crate::shell::Shell;
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// deskterm - virtual desktop terminal
#[derive(Parser)]
#[command(name = "deskterm")]
#[command(about = "Unix-like shell over a virtual file system with remote or local storage")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path (layered over the global config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Bearer token for the remote store; omit for local-only storage
    #[arg(long, env = "DESKVFS_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Email shown by `whoami` when signed in
    #[arg(long, global = true)]
    pub email: Option<String>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive terminal (default)
    Shell,
    /// Execute command lines once each and print their output
    Run {
        /// Lines to run, e.g. "ls -l" "cat welcome.txt"
        #[arg(required = true)]
        lines: Vec<String>,
    },
    /// Notes stored under the notes directory
    Notes {
        #[command(subcommand)]
        command: NotesCommands,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
pub enum NotesCommands {
    /// List notes
    List,
    /// Print a note
    Show { name: String },
    /// Replace a note's content, creating it if needed
    Write {
        name: String,
        /// Words joined with spaces
        #[arg(required = true)]
        text: Vec<String>,
    },
}

impl Cli {
    /// Effective configuration with command-line logging overrides applied.
    pub fn load_config(&self) -> Result<AppConfig, ApiError> {
        let mut config = match &self.config {
            Some(path) => ConfigLoader::load_with_file(path)?,
            None => ConfigLoader::load()?,
        };
        let logging = &mut config.logging;
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            logging.output = output.clone();
        }
        if self.log_file.is_some() {
            logging.file = self.log_file.clone();
        }
        crate::logging::validate(&config.logging)?;
        Ok(config)
    }

    pub fn session(&self) -> Option<Session> {
        let token = self.token.as_deref().filter(|t| !t.is_empty())?;
        let session = Session::new(token);
        Some(match &self.email {
            Some(email) => session.with_email(email),
            None => session,
        })
    }
}

/// CLI context owning the desktop for one invocation
pub struct CliContext {
    desktop: Desktop,
}

impl CliContext {
    pub fn new(config: AppConfig, session: Option<Session>) -> Result<Self, ApiError> {
        Ok(Self {
            desktop: Desktop::open(config, session)?,
        })
    }

    pub fn from_desktop(desktop: Desktop) -> Self {
        Self { desktop }
    }

    pub fn desktop(&self) -> &Desktop {
        &self.desktop
    }

    /// Execute a non-interactive command
    pub async fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Shell => Err(ApiError::ConfigError(
                "the interactive shell is started with CliContext::repl".to_string(),
            )),
            Commands::Run { lines } => {
                let (mut shell, sync) = self.desktop.open_terminal().await;
                let mut outputs = Vec::with_capacity(lines.len());
                for line in lines {
                    let output = shell.submit(line).await;
                    if !output.is_empty() {
                        outputs.push(output);
                    }
                }
                if shell.is_editing() {
                    shell.exit_edit();
                }
                sync.shutdown().await;
                Ok(outputs.join("\n"))
            }
            Commands::Notes { command } => {
                let (mut notes, sync) = self.desktop.open_notes().await;
                let result = self.execute_notes(&mut notes, command).await;
                sync.shutdown().await;
                result
            }
            Commands::Config => toml::to_string_pretty(self.desktop.config())
                .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e))),
        }
    }

    async fn execute_notes(
        &self,
        notes: &mut NotesSurface,
        command: &NotesCommands,
    ) -> Result<String, ApiError> {
        match command {
            NotesCommands::List => Ok(format_notes_table(notes)),
            NotesCommands::Show { name } => match notes.select(name).await? {
                Some(note) if note.text().is_empty() => Ok("(empty note)".to_string()),
                Some(note) => Ok(note.text().to_string()),
                None => Err(BackendError::MissingPath(notes.note_path(name)).into()),
            },
            NotesCommands::Write { name, text } => {
                if notes.select(name).await?.is_none() {
                    notes.create(name).await?;
                }
                notes.edit(text.join(" "));
                let saved = notes.save_now().await?;
                Ok(format!(
                    "Saved {}",
                    saved.map(|n| n.path).unwrap_or_else(|| notes.note_path(name))
                ))
            }
        }
    }

    /// Interactive terminal on stdin/stdout until EOF or `exit`.
    pub async fn repl(&self) -> Result<(), ApiError> {
        let (mut shell, sync) = self.desktop.open_terminal().await;
        println!("{}", "Desktop terminal. Type 'help' for commands, 'exit' to quit.".bold());

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            self.print_prompt(&shell)?;
            let Some(line) = lines.next_line().await? else {
                break;
            };

            if shell.is_editing() {
                self.editor_line(&mut shell, &line).await;
                continue;
            }
            match line.trim() {
                "exit" | ":quit" => break,
                ":login" => {
                    if let Err(err) = self.login().await {
                        eprintln!("login: {}", err);
                    }
                }
                ":logout" => {
                    self.desktop.sessions().sign_out();
                    println!("Signed out; using local storage");
                }
                _ => {
                    let output = shell.submit(&line).await;
                    if line.split_whitespace().next() == Some("clear") {
                        print!("{}", CLEAR_SCREEN);
                    } else if !output.is_empty() {
                        println!("{}", output);
                    }
                    if let Some(file) = shell.editor().path() {
                        println!(
                            "{}",
                            format!("-- editing {} (:w save, :q quit, :wq save and quit) --", file)
                                .dimmed()
                        );
                        if let Some(buffer) = shell.editor().buffer().filter(|b| !b.is_empty()) {
                            println!("{}", buffer);
                        }
                    }
                }
            }
        }

        sync.shutdown().await;
        info!("terminal closed");
        Ok(())
    }

    /// Nano-mode input: `:w`, `:q`, `:wq`, anything else appends to the buffer.
    async fn editor_line(&self, shell: &mut Shell, line: &str) {
        match line.trim() {
            ":w" => println!("{}", shell.save_edit().await),
            ":q" => shell.exit_edit(),
            ":wq" => {
                println!("{}", shell.save_edit().await);
                shell.exit_edit();
            }
            _ => shell.editor_mut().append_line(line),
        }
    }

    fn print_prompt(&self, shell: &Shell) -> Result<(), ApiError> {
        let mut stdout = std::io::stdout();
        if shell.is_editing() {
            write!(stdout, "{} ", ">".dimmed())?;
        } else {
            let user = self
                .desktop
                .sessions()
                .current()
                .and_then(|s| s.email)
                .unwrap_or_else(|| "guest".to_string());
            write!(
                stdout,
                "{}:{}$ ",
                user.green(),
                display_cwd(shell.cwd(), shell.home()).blue()
            )?;
        }
        stdout.flush()?;
        Ok(())
    }

    async fn login(&self) -> Result<(), ApiError> {
        let prompt = tokio::task::spawn_blocking(|| {
            use dialoguer::{Input, Password};

            let token = Password::new()
                .with_prompt("Token")
                .interact()
                .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))?;
            let email: String = Input::new()
                .with_prompt("Email")
                .allow_empty(true)
                .interact_text()
                .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))?;
            Ok::<_, ApiError>((token, email))
        })
        .await
        .map_err(|e| ApiError::ConfigError(format!("Login prompt failed: {}", e)))?;

        let (token, email) = prompt?;
        if token.is_empty() {
            println!("No token given; still using local storage");
            return Ok(());
        }
        let session = Session::new(token);
        let session = if email.is_empty() {
            session
        } else {
            session.with_email(email)
        };
        self.desktop.sessions().sign_in(session);
        println!("Signed in; using the remote store");
        Ok(())
    }
}

/// Working directory with the home prefix shown as `~`
fn display_cwd(cwd: &str, home: &str) -> String {
    if cwd == home {
        return "~".to_string();
    }
    match path::rebase(cwd, home, "~") {
        Some(short) => short,
        None => cwd.to_string(),
    }
}

fn format_notes_table(notes: &NotesSurface) -> String {
    let listed = notes.list();
    if listed.is_empty() {
        return format!("No notes in {}", notes.notes_dir());
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Name", "Bytes", "Updated"]);
    for note in &listed {
        table.add_row(vec![
            note.name.clone(),
            note.text().len().to_string(),
            note.updated_at.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LocalBackend;

    fn context() -> CliContext {
        let desktop =
            Desktop::with_local(AppConfig::default(), None, LocalBackend::temporary().unwrap())
                .unwrap();
        CliContext::from_desktop(desktop)
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["deskterm", "run", "ls", "--email", "a@b.c"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Run { .. })));
        assert_eq!(cli.email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn session_requires_a_token() {
        let cli = Cli::try_parse_from(["deskterm", "--token", "", "config"]).unwrap();
        assert!(cli.session().is_none());
        let cli = Cli::try_parse_from(["deskterm", "--token", "t", "--email", "me@x"]).unwrap();
        assert_eq!(cli.session().and_then(|s| s.email).as_deref(), Some("me@x"));
    }

    #[test]
    fn home_is_abbreviated() {
        assert_eq!(display_cwd("/home", "/home"), "~");
        assert_eq!(display_cwd("/home/notes", "/home"), "~/notes");
        assert_eq!(display_cwd("/etc", "/home"), "/etc");
    }

    #[tokio::test]
    async fn run_prints_each_output() {
        let ctx = context();
        let lines = vec!["mkdir demo".to_string(), "ls".to_string(), "pwd".to_string()];
        let output = ctx.execute(&Commands::Run { lines }).await.unwrap();
        assert!(output.contains("demo/"));
        assert!(output.ends_with("/home"));
    }

    #[tokio::test]
    async fn notes_write_then_show() {
        let ctx = context();
        let write = NotesCommands::Write {
            name: "ideas".to_string(),
            text: vec!["ship".to_string(), "it".to_string()],
        };
        let saved = ctx.execute(&Commands::Notes { command: write }).await.unwrap();
        assert_eq!(saved, "Saved /home/notes/ideas.txt");

        let show = NotesCommands::Show {
            name: "ideas".to_string(),
        };
        let shown = ctx.execute(&Commands::Notes { command: show }).await.unwrap();
        assert_eq!(shown, "ship it");

        let listed = ctx
            .execute(&Commands::Notes {
                command: NotesCommands::List,
            })
            .await
            .unwrap();
        assert!(listed.contains("ideas.txt"));
    }

    #[tokio::test]
    async fn config_renders_as_toml() {
        let rendered = context().execute(&Commands::Config).await.unwrap();
        assert!(rendered.contains("[sync]"));
        assert!(rendered.contains("interval_ms = 2000"));
    }
}
