//! Sync orchestrator state machine.
//!
//! One engine runs one logical sync at a time: locate the save, query the
//! remote, back up both sides, compare, resolve divergence through the
//! [`ConflictResolver`], issue at most one directional copy, and close with
//! the bidirectional reconciliation pass. Cancellation at the resolver is
//! the only path that skips the closing pass.

use crate::backup;
use crate::compare;
use crate::config::{ConfigStore, SyncConfig};
use crate::error::SyncResult;
use crate::events::{NullObserver, SyncObserver};
use crate::locator;
use crate::remote::{find_remote_save, CloudTransport};
use crate::resolver::{ConflictResolver, Resolution};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// The current state of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No sync in progress.
    Idle,
    /// Backing up and evaluating equality.
    Comparing,
    /// Waiting on the conflict resolver.
    Resolving,
    /// Running the final reconciliation pass.
    Reconciling,
    /// Last run finished.
    Done,
    /// Last run was canceled at the resolver.
    Canceled,
}

impl SyncState {
    /// Returns true if a run has ended in this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncState::Done | SyncState::Canceled)
    }
}

/// Statistics across the lifetime of an engine.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Completed sync runs (including up-to-date and initialized runs).
    pub runs_completed: u64,
    /// Divergences put to the resolver.
    pub conflicts_resolved: u64,
    /// Message of the most recent outcome.
    pub last_outcome: Option<String>,
}

/// Terminal result of one sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Neither side had a save; the baseline pass seeded both.
    Initialized,
    /// Saves were provably identical.
    UpToDate,
    /// A divergence was resolved and reconciled.
    Completed,
    /// The user canceled at the conflict prompt. Backups had already been
    /// made and are reported here.
    Canceled {
        /// Local backup location, when the local backup succeeded.
        local_backup: Option<PathBuf>,
        /// Remote backup location (best-effort).
        remote_backup: String,
    },
}

impl SyncOutcome {
    /// Human-readable terminal message.
    pub fn message(&self) -> String {
        match self {
            SyncOutcome::Initialized => "Initialized (no saves yet).".to_string(),
            SyncOutcome::UpToDate => "Up to date.".to_string(),
            SyncOutcome::Completed => "Sync complete.".to_string(),
            SyncOutcome::Canceled {
                local_backup,
                remote_backup,
            } => {
                let local = local_backup
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(backup failed)".to_string());
                format!("Canceled. Backups: local→{local}, cloud→{remote_backup}")
            }
        }
    }
}

/// The sync engine ties locator, comparison, backups, resolver, and
/// transport together.
pub struct SyncEngine<T: CloudTransport> {
    config: SyncConfig,
    transport: T,
    resolver: Option<Box<dyn ConflictResolver>>,
    observer: Box<dyn SyncObserver>,
    state: RwLock<SyncState>,
    stats: RwLock<SyncStats>,
}

impl<T: CloudTransport> SyncEngine<T> {
    /// Creates an engine with no resolver (divergences default to
    /// keep-local, the headless behavior) and no observer.
    pub fn new(config: SyncConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            resolver: None,
            observer: Box::new(NullObserver),
            state: RwLock::new(SyncState::Idle),
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// Sets the conflict resolver.
    pub fn with_resolver(mut self, resolver: Box<dyn ConflictResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Sets the progress observer.
    pub fn with_observer(mut self, observer: Box<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// The engine's configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The current state.
    pub fn state(&self) -> SyncState {
        *self.state.read()
    }

    /// A snapshot of lifetime statistics.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    fn set_state(&self, state: SyncState) {
        *self.state.write() = state;
    }

    fn finish(&self, outcome: SyncOutcome) -> SyncOutcome {
        let terminal = match outcome {
            SyncOutcome::Canceled { .. } => SyncState::Canceled,
            _ => SyncState::Done,
        };
        self.set_state(terminal);
        let mut stats = self.stats.write();
        stats.runs_completed += 1;
        stats.last_outcome = Some(outcome.message());
        outcome
    }

    /// Resolves the active local save-profile directory from the configured
    /// root override or platform detection.
    pub fn locate_local_dir(&self) -> SyncResult<PathBuf> {
        let root = match &self.config.save_root {
            Some(root) => root.clone(),
            None => locator::detect_save_root()?,
        };
        locator::select_profile(&root)
    }

    /// Runs the one-time baseline reconciliation for this host if it has not
    /// happened yet, gated through the persisted config store.
    ///
    /// Returns true when a baseline pass was performed.
    pub fn ensure_host_baseline(
        &self,
        store: &mut dyn ConfigStore,
        local_dir: &Path,
    ) -> SyncResult<bool> {
        let host = &self.config.machine_tag;
        if store.host_resynced(host) {
            return Ok(false);
        }
        info!(host, "running one-time baseline sync for this host");
        self.observer.status("Initializing this device (one-time)…");
        self.transport
            .bisync(local_dir, &self.config.remote, true, self.observer.as_ref())?;
        store.mark_host_resynced(host)?;
        Ok(true)
    }

    /// Locates the local save directory and runs a full sync against it.
    pub fn run(&self) -> SyncResult<SyncOutcome> {
        let local_dir = self.locate_local_dir()?;
        self.sync(&local_dir)
    }

    /// Runs one sync of `local_dir` against the configured remote.
    pub fn sync(&self, local_dir: &Path) -> SyncResult<SyncOutcome> {
        let remote = self.config.remote.as_str();
        let observer = self.observer.as_ref();

        let local_save = locator::find_save_file(local_dir);
        let entries = self.transport.list(remote);
        let remote_entry = find_remote_save(&entries).cloned();
        let local_exists = local_save.exists();

        if !local_exists && remote_entry.is_none() {
            info!(local = %local_dir.display(), remote, "no saves on either side, initializing");
            observer.status("No saves yet. Initializing…");
            self.transport.bisync(local_dir, remote, true, observer)?;
            return Ok(self.finish(SyncOutcome::Initialized));
        }

        // Backups come before the equality check is even evaluated.
        self.set_state(SyncState::Comparing);
        observer.status("Creating backups…");
        let local_backup = match backup::backup_local(local_dir) {
            Ok(path) => Some(path),
            Err(err) => {
                warn!(%err, "local backup failed, continuing");
                None
            }
        };
        let remote_backup = backup::backup_remote(&self.transport, remote, observer);

        let comparison = compare::classify(Some(&local_save), remote_entry.as_ref());

        if comparison == compare::Comparison::Equal {
            observer.status("Matching saves. Syncing…");
            self.set_state(SyncState::Reconciling);
            self.transport.bisync(local_dir, remote, false, observer)?;
            return Ok(self.finish(SyncOutcome::UpToDate));
        }

        self.set_state(SyncState::Resolving);
        let choice = match &self.resolver {
            Some(resolver) => {
                let preview = compare::preview(
                    local_exists.then_some(local_save.as_path()),
                    remote_entry.as_ref(),
                );
                self.stats.write().conflicts_resolved += 1;
                resolver.resolve(&preview)
            }
            None => Resolution::KeepLocal,
        };

        match choice {
            Resolution::Cancel => {
                info!("sync canceled at conflict prompt");
                return Ok(self.finish(SyncOutcome::Canceled {
                    local_backup,
                    remote_backup,
                }));
            }
            Resolution::KeepLocal => {
                observer.status("Pushing this machine's save…");
                self.transport.copy_to_remote(local_dir, remote, observer)?;
            }
            Resolution::UseCloud => {
                observer.status("Pulling cloud save…");
                self.transport.copy_to_local(remote, local_dir, observer)?;
            }
            Resolution::KeepBoth => {
                observer.status("Keeping both (duplicating local)…");
                if let Some(variant) =
                    backup::tag_local_variant(&local_save, &self.config.machine_tag)?
                {
                    info!(variant = %variant.display(), "created machine-tagged variant");
                }
            }
        }

        observer.status("Finalizing sync…");
        self.set_state(SyncState::Reconciling);
        self.transport.bisync(local_dir, remote, false, observer)?;
        Ok(self.finish(SyncOutcome::Completed))
    }
}
