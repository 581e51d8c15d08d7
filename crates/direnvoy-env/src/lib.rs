// ABOUTME: Environment import orchestration crate for directory-scoped environments
// ABOUTME: Locates declaration files, runs direnv, parses its export, and merges the result

pub mod config;
pub mod error;
pub mod invoke;
pub mod locate;
pub mod merge;
pub mod notify;
pub mod orchestrator;
pub mod parse;
pub mod store;


#[cfg(test)]
mod test_util;

// Re-export main types for easy access
pub use config::{ConflictPolicy, ExportFormat, ImportConfig};
pub use error::ImportError;
pub use invoke::{DEFAULT_TOOL, DirenvInvoker};
pub use locate::{DECLARATION_FILES, EnvFile, EnvrcLocator};
pub use merge::{EnvMerger, MergeSummary};
pub use notify::{ImportNotifier, NullNotifier};
pub use orchestrator::{ImportOrchestrator, ImportOutcome, ImportRequest};
pub use parse::{EnvDiff, OutputParser};
pub use store::EnvStore;
