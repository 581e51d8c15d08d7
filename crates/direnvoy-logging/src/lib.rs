// ABOUTME: Public API for direnvoy logging infrastructure using tokio-tracing
// ABOUTME: Provides centralized configuration and initialization for structured logging

pub mod config;
pub mod layers;
pub mod subscriber;

// Re-export tracing macros for convenience
pub use tracing::{Level, Span, debug, error, info, instrument, span, trace, warn};

// Re-export configuration types
pub use config::{LogLevel, LoggingConfig};

// Re-export initialization functions
pub use subscriber::init_subscriber;

use anyhow::Result;

/// Initialize logging with default configuration plus environment overrides.
///
/// Honors `DIRENVOY_LOG`, `DIRENVOY_LOG_FILE`, `DIRENVOY_LOG_NO_CONSOLE`
/// and `RUST_LOG`.
pub fn init_logging() -> Result<()> {
    let config = LoggingConfig::from_env()?;
    init_subscriber(config)
}

/// Initialize logging with custom configuration.
pub fn init_logging_with_config(config: LoggingConfig) -> Result<()> {
    init_subscriber(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macros_available() {
        info!("Test info message");
        debug!("Test debug message");
        warn!("Test warning message");
        error!("Test error message");
    }
}
