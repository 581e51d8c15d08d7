// ABOUTME: Import configuration types consumed at orchestrator construction
// ABOUTME: Explicitly injected, there is no global settings state in this crate

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// What to do when an imported variable is already present in the target
/// store with a different value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Imported value replaces the existing one
    Overwrite,
    /// Existing value is kept, imported value is dropped
    Preserve,
    /// The whole merge is rejected; the store is left untouched
    Error,
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        ConflictPolicy::Overwrite
    }
}

/// Encoding the external tool is asked to emit on stdout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// JSON object of name to value-or-null, direnv's `export json`
    Json,
    /// NUL-separated NAME=VALUE records, safe for multi-line values
    NulDelimited,
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat::Json
    }
}

impl ExportFormat {
    /// Argument passed to `<tool> export <format>`.
    pub fn as_arg(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::NulDelimited => "nul",
        }
    }
}

/// Configuration for one import orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Path to the environment tool; `direnv` resolved from PATH when unset
    pub direnv_path: Option<PathBuf>,

    /// Output encoding requested from the tool
    pub format: ExportFormat,

    /// Upper bound on one tool invocation, in milliseconds
    pub timeout_ms: u64,

    /// Conflict policy applied while merging into the target store
    pub on_conflict: ConflictPolicy,

    /// Import automatically when an execution-start hook fires
    pub auto_import_on_execution: bool,

    /// Upper bound on concurrently running tool processes
    pub max_concurrent_invocations: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            direnv_path: None,
            format: ExportFormat::default(),
            timeout_ms: 5_000,
            on_conflict: ConflictPolicy::default(),
            auto_import_on_execution: true,
            max_concurrent_invocations: 3,
        }
    }
}

impl ImportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
