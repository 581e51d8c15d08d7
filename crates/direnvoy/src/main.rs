// ABOUTME: Entry point of the direnvoy binary
// ABOUTME: Wires config, logging, the orchestrator, and the terminal notifier together

use anyhow::{Context, Result};
use clap::Parser;
use direnvoy_env::{EnvStore, ImportOrchestrator};
use std::sync::Arc;
use tokio::sync::Mutex;

mod cli;
mod commands;
mod notification;
mod settings;

use cli::{Cli, Command};
use notification::TerminalNotifier;

fn setup_logging(verbosity: u8) -> Result<()> {
    use direnvoy_logging::{Level, LoggingConfig, init_logging_with_config};

    let mut config =
        LoggingConfig::from_env().context("Failed to create logging config from environment")?;

    // Command line verbosity beats the environment
    if verbosity > 0 {
        let level = match verbosity {
            1 => Level::INFO,
            2 => Level::DEBUG,
            _3_or_more => Level::TRACE,
        };
        config.level = level.into();
    }

    init_logging_with_config(config).context("Failed to initialize direnvoy logging")
}

async fn run(cli: Cli) -> Result<i32> {
    let config = settings::load_config(cli.config.as_deref())?;

    let store = Arc::new(Mutex::new(EnvStore::from_process_env()));
    let orchestrator = Arc::new(
        ImportOrchestrator::from_config(&config, Arc::clone(&store))
            .with_notifier(Arc::new(TerminalNotifier)),
    );

    match cli.command {
        Command::Import { dir } => Ok(commands::import(&orchestrator, &dir).await),
        Command::Exec { dir, command } => commands::exec(&orchestrator, &dir, &command).await,
        Command::Allow { dir } => Ok(commands::allow(&orchestrator, &dir).await),
        Command::Status { dir } => Ok(commands::status(&dir)),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = setup_logging(cli.verbose) {
        eprintln!("direnvoy: {err:#}");
    }

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("direnvoy: {err:#}");
            std::process::exit(2);
        }
    }
}
