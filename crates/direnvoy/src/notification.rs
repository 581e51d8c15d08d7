// ABOUTME: Terminal implementation of the library's ImportNotifier trait
// ABOUTME: Stands in for the notification balloons an IDE host would show

use direnvoy_env::{ImportError, ImportNotifier, MergeSummary};
use std::path::Path;

/// Prints import notifications to stderr, keeping stdout free for command
/// output (`exec`) and machine-readable summaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

impl ImportNotifier for TerminalNotifier {
    fn import_succeeded(&self, dir: &Path, summary: &MergeSummary) {
        eprintln!(
            "direnvoy: imported {} ({} set, {} unset)",
            dir.display(),
            summary.set,
            summary.unset
        );
    }

    fn import_unchanged(&self, dir: &Path) {
        eprintln!("direnvoy: {} already up to date", dir.display());
    }

    fn import_failed(&self, dir: &Path, error: &ImportError) {
        eprintln!("direnvoy: import of {} failed: {}", dir.display(), error);
    }
}
