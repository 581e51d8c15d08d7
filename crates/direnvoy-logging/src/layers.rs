// ABOUTME: Layer construction for the different logging output targets
// ABOUTME: Provides console and file layers plus env-filter assembly

use anyhow::{Context, Result};
use std::fs;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
};

use crate::config::{FileConfig, LoggingConfig, OutputConfig};

/// Create a console output layer writing to stderr.
///
/// Stderr keeps log lines out of the way of subcommand output such as the
/// summary `import` prints.
pub fn create_console_layer(
    config: &OutputConfig,
) -> Option<Box<dyn Layer<Registry> + Send + Sync + 'static>> {
    if !config.console {
        return None;
    }

    let layer = if config.pretty_console {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_span_events(FmtSpan::CLOSE)
            .pretty()
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .boxed()
    };

    Some(layer)
}

/// Create a file output layer with daily rotation.
pub fn create_file_layer(
    config: &FileConfig,
) -> Result<Box<dyn Layer<Registry> + Send + Sync + 'static>> {
    if let Some(parent) = config.path.parent() {
        fs::create_dir_all(parent).context(format!(
            "Failed to create log directory: {}",
            parent.display()
        ))?;
    }

    let file_name = config
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .context("Invalid log file path")?;

    let directory = config
        .path
        .parent()
        .context("Log file path has no parent directory")?;

    let file_appender = rolling::daily(directory, file_name);
    let (non_blocking_writer, guard) = non_blocking(file_appender);

    let layer = fmt::layer()
        .with_writer(non_blocking_writer)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .boxed();

    // The guard must outlive the subscriber, which lives for the whole process.
    std::mem::forget(guard);

    Ok(layer)
}

/// Create an environment filter from the logging configuration.
pub fn create_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let mut filter = EnvFilter::new(format!("{}", config.level.0));

    // Add module-specific filters
    for (module, level) in &config.module_levels {
        filter = filter.add_directive(format!("{}={}", module, level.0).parse()?);
    }

    Ok(filter)
}
