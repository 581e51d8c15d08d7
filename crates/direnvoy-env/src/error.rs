// ABOUTME: Error taxonomy for environment import operations
// ABOUTME: Every variant is recovered at the orchestrator boundary, nothing panics through

use std::path::PathBuf;
use std::time::Duration;

/// Error types for environment import operations.
///
/// Variants carry owned strings instead of source errors so outcomes can be
/// cloned to every waiter coalesced onto one in-flight import.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ImportError {
    #[error("I/O error on {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("environment tool `{tool}` not found on PATH")]
    ToolNotFound { tool: String },

    #[error("environment tool timed out after {timeout:?}")]
    ToolTimeout { timeout: Duration },

    #[error("environment tool exited with code {code}: {stderr}")]
    ToolExitNonZero { code: i32, stderr: String },

    #[error("{path} is blocked; approve it with `direnvoy allow`")]
    EnvrcBlocked { path: PathBuf },

    #[error("failed to parse environment tool output: {message}")]
    Parse { message: String },

    #[error("variable `{name}` is already set and the conflict policy is `error`")]
    Conflict { name: String },
}

impl ImportError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        ImportError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
