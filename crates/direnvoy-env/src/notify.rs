// ABOUTME: Notification trait for import completion, implemented by host layers
// ABOUTME: Default-empty methods so a host only implements what it surfaces

use std::path::Path;

use crate::error::ImportError;
use crate::merge::MergeSummary;

/// Receives import completion notifications.
///
/// Delivery (balloons, terminal output, status bars) is the host layer's
/// concern; the orchestrator only decides *whether* to notify, gated by the
/// request's notify flags.
pub trait ImportNotifier: Send + Sync {
    /// Variables were applied to the store.
    fn import_succeeded(&self, _dir: &Path, _summary: &MergeSummary) {}

    /// The import ran but the store was already up to date.
    fn import_unchanged(&self, _dir: &Path) {}

    /// The import reached a failure terminal state.
    fn import_failed(&self, _dir: &Path, _error: &ImportError) {}
}

/// Notifier that drops everything, for hosts without a notification surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl ImportNotifier for NullNotifier {}
