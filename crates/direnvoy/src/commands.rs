// ABOUTME: Subcommand handlers for the direnvoy binary
// ABOUTME: Each returns the process exit code; notifications go through the terminal notifier

use anyhow::{Context, Result};
use direnvoy_env::{EnvrcLocator, ImportOrchestrator, ImportOutcome, ImportRequest};
use direnvoy_logging::warn;
use std::ffi::OsString;
use std::path::Path;

/// `direnvoy import <dir>` — a manual, fully notified import.
pub async fn import(orchestrator: &ImportOrchestrator, dir: &Path) -> i32 {
    match orchestrator.import(ImportRequest::manual(dir)).await {
        ImportOutcome::Applied(_) | ImportOutcome::Unchanged => 0,
        ImportOutcome::NoFile => {
            eprintln!("direnvoy: no declaration file in {}", dir.display());
            1
        }
        // The notifier already reported the failure
        ImportOutcome::Failed(_) => 1,
    }
}

/// `direnvoy exec <dir> <command>...` — the execution lifecycle hook: import
/// quietly (when configured), then run the command with the merged
/// environment in the project directory.
pub async fn exec(
    orchestrator: &ImportOrchestrator,
    dir: &Path,
    command: &[OsString],
) -> Result<i32> {
    if let Some(ImportOutcome::Failed(err)) = orchestrator.on_execution_start(dir).await {
        // The command still runs, with the unmodified environment
        warn!(error = %err, "pre-execution import failed");
    }

    let env = orchestrator.store().lock().await.to_map();

    let (program, args) = command.split_first().context("empty command")?;
    let status = tokio::process::Command::new(program)
        .args(args)
        .env_clear()
        .envs(&env)
        .current_dir(dir)
        .status()
        .await
        .context(format!("failed to run {}", program.to_string_lossy()))?;

    Ok(status.code().unwrap_or(1))
}

/// `direnvoy allow <dir>` — approve a blocked declaration file and import it.
pub async fn allow(orchestrator: &ImportOrchestrator, dir: &Path) -> i32 {
    match orchestrator.allow(dir).await {
        ImportOutcome::Applied(_) | ImportOutcome::Unchanged => 0,
        ImportOutcome::NoFile => {
            eprintln!("direnvoy: no declaration file in {}", dir.display());
            1
        }
        // Failures are reported by the notifier or the orchestrator's own logging
        ImportOutcome::Failed(_) => 1,
    }
}

/// `direnvoy status <dir>` — report the declaration file, if any.
pub fn status(dir: &Path) -> i32 {
    match EnvrcLocator.locate(dir) {
        Ok(Some(file)) => {
            println!("{}", file.path.display());
            0
        }
        Ok(None) => {
            println!("no declaration file in {}", dir.display());
            1
        }
        Err(err) => {
            eprintln!("direnvoy: {err}");
            2
        }
    }
}
