// ABOUTME: Tracing subscriber initialization and layer composition
// ABOUTME: Combines console and file layers with filtering for complete logging setup

use anyhow::{Context, Result};

use crate::config::LoggingConfig;
use crate::layers::{create_console_layer, create_env_filter, create_file_layer};

/// Initialize the global tracing subscriber with the given configuration.
pub fn init_subscriber(config: LoggingConfig) -> Result<()> {
    use tracing_subscriber::prelude::*;

    let env_filter = create_env_filter(&config).context("Failed to create environment filter")?;

    // Collect boxed layers so console and file stay independently optional
    let mut layers = Vec::new();
    if let Some(console_layer) = create_console_layer(&config.output) {
        layers.push(console_layer);
    }
    if config.output.file {
        layers.push(create_file_layer(&config.file).context("Failed to create file layer")?);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(
        log_level = %config.level.0,
        console_output = config.output.console,
        file_output = config.output.file,
        file_path = %config.file.path.display(),
        "Direnvoy logging initialized"
    );

    Ok(())
}
