//! deskterm binary
//!
//! Command-line interface for the desktop virtual file system.

use anyhow::Context;
use clap::Parser;
use deskvfs::cli::{Cli, CliContext, Commands};
use deskvfs::logging::init_logging;
use std::process;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config().context("loading configuration")?;
    init_logging(Some(&config.logging)).context("initializing logging")?;

    let context =
        CliContext::new(config, cli.session()).context("opening the desktop file system")?;

    match cli.command.as_ref().unwrap_or(&Commands::Shell) {
        Commands::Shell => context.repl().await?,
        command => {
            let output = context.execute(command).await?;
            if !output.is_empty() {
                println!("{}", output);
            }
        }
    }
    Ok(())
}
