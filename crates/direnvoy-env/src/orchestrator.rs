// ABOUTME: Composes locator, invoker, parser, and merger into one import entry point
// ABOUTME: Coalesces concurrent imports per directory and folds every error into the outcome

use direnvoy_logging::{debug, info, instrument, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use crate::config::ImportConfig;
use crate::error::ImportError;
use crate::invoke::DirenvInvoker;
use crate::locate::EnvrcLocator;
use crate::merge::{EnvMerger, MergeSummary};
use crate::notify::ImportNotifier;
use crate::parse::OutputParser;
use crate::store::EnvStore;

/// One import operation, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    /// Directory whose declaration file should be imported
    pub dir: PathBuf,
    /// Await the terminal state instead of running detached
    pub synchronous: bool,
    pub notify_on_success: bool,
    pub notify_on_failure: bool,
    /// Also notify when the store was already up to date
    pub notify_unchanged: bool,
}

impl ImportRequest {
    /// A user-initiated import: detached, fully notified.
    pub fn manual(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            synchronous: false,
            notify_on_success: true,
            notify_on_failure: true,
            notify_unchanged: true,
        }
    }

    /// A startup import: blocks so the environment is ready before anything
    /// else runs, quiet about an already up-to-date store.
    pub fn startup(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            synchronous: true,
            notify_on_success: true,
            notify_on_failure: true,
            notify_unchanged: false,
        }
    }

    /// An execution-start import: blocks and stays silent either way.
    pub fn execution(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            synchronous: true,
            notify_on_success: false,
            notify_on_failure: false,
            notify_unchanged: false,
        }
    }
}

/// Terminal state of one import.
///
/// `NoFile` is the expected steady state for directories without a
/// declaration file, not a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    /// Variables were applied to the store
    Applied(MergeSummary),
    /// The import ran; the store already matched the tool output
    Unchanged,
    /// No declaration file in the directory
    NoFile,
    /// The import stopped at one of the taxonomy errors
    Failed(ImportError),
}

impl ImportOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ImportOutcome::Failed(_))
    }
}

type OutcomeRx = watch::Receiver<Option<ImportOutcome>>;

/// Removes a directory's in-flight entry when the leader finishes or is
/// cancelled mid-run, so a dropped leader never strands waiters behind a
/// dead channel.
struct InFlightGuard<'a> {
    orchestrator: &'a ImportOrchestrator,
    dir: &'a Path,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.orchestrator
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(self.dir);
    }
}

/// Runs imports: locate, invoke, parse, merge.
///
/// Constructed with its collaborators injected explicitly; configuration is
/// read once at construction, never from ambient state. All errors are
/// recovered here and turned into [`ImportOutcome::Failed`].
///
/// Imports for different directories run concurrently; concurrent imports
/// for the same (canonicalized) directory are coalesced onto one pipeline
/// run, so exactly one tool process is spawned and every caller observes the
/// same outcome.
pub struct ImportOrchestrator {
    locator: EnvrcLocator,
    invoker: DirenvInvoker,
    parser: OutputParser,
    merger: EnvMerger,
    store: Arc<Mutex<EnvStore>>,
    notifier: Option<Arc<dyn ImportNotifier>>,
    auto_import_on_execution: bool,
    // Synchronous lock: held only for map operations, never across an await,
    // and the leader's drop guard must be able to take it outside async
    in_flight: StdMutex<HashMap<PathBuf, OutcomeRx>>,
}

impl ImportOrchestrator {
    pub fn new(
        locator: EnvrcLocator,
        invoker: DirenvInvoker,
        parser: OutputParser,
        merger: EnvMerger,
        store: Arc<Mutex<EnvStore>>,
    ) -> Self {
        Self {
            locator,
            invoker,
            parser,
            merger,
            store,
            notifier: None,
            auto_import_on_execution: false,
            in_flight: StdMutex::new(HashMap::new()),
        }
    }

    /// Build all collaborators from one configuration.
    pub fn from_config(config: &ImportConfig, store: Arc<Mutex<EnvStore>>) -> Self {
        let mut orchestrator = Self::new(
            EnvrcLocator,
            DirenvInvoker::new(config),
            OutputParser::new(config.format),
            EnvMerger::new(config.on_conflict),
            store,
        );
        orchestrator.auto_import_on_execution = config.auto_import_on_execution;
        orchestrator
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn ImportNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// The target store this orchestrator merges into.
    pub fn store(&self) -> Arc<Mutex<EnvStore>> {
        Arc::clone(&self.store)
    }

    /// Run one import to its terminal state.
    #[instrument(skip(self, request), fields(directory = %request.dir.display()))]
    pub async fn import(&self, request: ImportRequest) -> ImportOutcome {
        let dir = request
            .dir
            .canonicalize()
            .unwrap_or_else(|_| request.dir.clone());

        enum Role {
            Leader(watch::Sender<Option<ImportOutcome>>),
            Follower(OutcomeRx),
        }

        let role = {
            let mut in_flight = self
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match in_flight.get(&dir) {
                Some(rx) => Role::Follower(rx.clone()),
                None => {
                    let (tx, rx) = watch::channel(None);
                    in_flight.insert(dir.clone(), rx);
                    Role::Leader(tx)
                }
            }
        };

        match role {
            Role::Leader(tx) => {
                // Armed before the first await: cancelling the leader mid-run
                // still clears the entry, so the next caller leads afresh
                let guard = InFlightGuard {
                    orchestrator: self,
                    dir: &dir,
                };
                let outcome = self.run(&dir).await;
                drop(guard);
                let _ = tx.send(Some(outcome.clone()));
                self.notify(&request, &dir, &outcome);
                outcome
            }
            Role::Follower(mut rx) => {
                debug!("coalescing onto in-flight import");
                loop {
                    let settled = rx.borrow_and_update().as_ref().cloned();
                    if let Some(outcome) = settled {
                        self.notify(&request, &dir, &outcome);
                        return outcome;
                    }
                    if rx.changed().await.is_err() {
                        break;
                    }
                }
                // The leader was cancelled before producing an outcome;
                // run our own import instead of reporting nothing.
                Box::pin(self.import(request)).await
            }
        }
    }

    /// Single dispatch entry point: awaits terminal state when the request
    /// is synchronous, otherwise detaches and returns immediately.
    pub async fn submit(this: &Arc<Self>, request: ImportRequest) -> Option<ImportOutcome> {
        if request.synchronous {
            Some(this.import(request).await)
        } else {
            Self::import_detached(this, request);
            None
        }
    }

    /// Run an import on a background task; completion is observable through
    /// the returned handle and through the notifier.
    pub fn import_detached(this: &Arc<Self>, request: ImportRequest) -> JoinHandle<ImportOutcome> {
        let orchestrator = Arc::clone(this);
        tokio::spawn(async move { orchestrator.import(request).await })
    }

    /// Hook for the host's execution lifecycle: a quiet, synchronous import
    /// before a program runs, skipped entirely unless configured.
    pub async fn on_execution_start(&self, dir: &Path) -> Option<ImportOutcome> {
        if !self.auto_import_on_execution {
            debug!("auto import on execution disabled, skipping");
            return None;
        }
        Some(self.import(ImportRequest::execution(dir)).await)
    }

    /// Approve a blocked declaration file, then import it.
    pub async fn allow(&self, dir: &Path) -> ImportOutcome {
        let file = match self.locator.locate(dir) {
            Ok(Some(file)) => file,
            Ok(None) => return ImportOutcome::NoFile,
            Err(err) => return ImportOutcome::Failed(err),
        };

        if let Err(err) = self.invoker.allow(&file).await {
            warn!(error = %err, "allow failed");
            return ImportOutcome::Failed(err);
        }

        info!(path = %file.path.display(), "declaration file approved");
        self.import(ImportRequest::manual(dir)).await
    }

    async fn run(&self, dir: &Path) -> ImportOutcome {
        // Locating
        let file = match self.locator.locate(dir) {
            Ok(Some(file)) => file,
            Ok(None) => return ImportOutcome::NoFile,
            Err(err) => return ImportOutcome::Failed(err),
        };

        // Invoking
        let stdout = match self.invoker.invoke(&file).await {
            Ok(stdout) => stdout,
            Err(err) => return ImportOutcome::Failed(err),
        };

        // Parsing
        let diff = match self.parser.parse(&stdout) {
            Ok(diff) => diff,
            Err(err) => return ImportOutcome::Failed(err),
        };

        // Merging
        let summary = {
            let mut store = self.store.lock().await;
            match self.merger.merge(&diff, &mut store) {
                Ok(summary) => summary,
                Err(err) => return ImportOutcome::Failed(err),
            }
        };

        if summary.changed() == 0 {
            debug!(path = %file.path.display(), "environment already up to date");
            ImportOutcome::Unchanged
        } else {
            info!(
                path = %file.path.display(),
                set = summary.set,
                unset = summary.unset,
                "environment imported"
            );
            ImportOutcome::Applied(summary)
        }
    }

    fn notify(&self, request: &ImportRequest, dir: &Path, outcome: &ImportOutcome) {
        let Some(notifier) = &self.notifier else {
            return;
        };

        match outcome {
            ImportOutcome::Applied(summary) if request.notify_on_success => {
                notifier.import_succeeded(dir, summary);
            }
            ImportOutcome::Unchanged if request.notify_unchanged => {
                notifier.import_unchanged(dir);
            }
            ImportOutcome::Failed(err) if request.notify_on_failure => {
                notifier.import_failed(dir, err);
            }
            _ => {}
        }
    }
}
