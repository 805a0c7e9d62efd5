//! The host-facing status service.
//!
//! [`StatusService`] owns everything that outlives a single collection: the
//! settings, the command runner, the fetch scheduler and one [`Poller`] per
//! target. Hosts drive it through three calls (a target changed directory, a
//! target went away, a target wants its text) and learn about new snapshots
//! from the receiver returned by [`StatusService::new`].
//!
//! Rendering never waits for git: [`StatusService::request_render`] reads the
//! last published snapshot, which collections replace as they finish.

use crate::core::aggregator::SnapshotAggregator;
use crate::core::config::{apply_log_level, HostKnobs, Settings};
use crate::core::poller::{CollectContext, Poller};
use crate::core::render::{render, Rendering};
use crate::core::repo::RepoRoot;
use crate::core::runner::{CommandRunner, GitCli, ProcessRunner};
use crate::core::scheduler::{FetchDone, FetchScheduler};
use crate::core::snapshot::{StatusSnapshot, TargetId};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};
use tokio::sync::mpsc;

struct Entry {
    poller: tokio::sync::Mutex<Poller>,
    published: Mutex<Option<StatusSnapshot>>,
}

struct Inner {
    runner: Arc<dyn CommandRunner>,
    settings: RwLock<Settings>,
    scheduler: FetchScheduler,
    aggregator: SnapshotAggregator,
    entries: Mutex<HashMap<TargetId, Arc<Entry>>>,
    changed_tx: mpsc::UnboundedSender<TargetId>,
}

#[derive(Clone)]
pub struct StatusService {
    inner: Arc<Inner>,
}

impl StatusService {
    /// Create a service backed by real `git` processes
    pub fn with_settings(settings: Settings) -> (Self, mpsc::UnboundedReceiver<TargetId>) {
        Self::new(settings, Arc::new(ProcessRunner))
    }

    /// Create a service. Must be called inside a tokio runtime.
    ///
    /// The receiver yields a target id every time that target's published
    /// snapshot changes; unchanged collections are not reported.
    pub fn new(
        settings: Settings,
        runner: Arc<dyn CommandRunner>,
    ) -> (Self, mpsc::UnboundedReceiver<TargetId>) {
        Self::with_aggregator(settings, runner, SnapshotAggregator::default())
    }

    pub fn with_aggregator(
        settings: Settings,
        runner: Arc<dyn CommandRunner>,
        aggregator: SnapshotAggregator,
    ) -> (Self, mpsc::UnboundedReceiver<TargetId>) {
        let (changed_tx, changed_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = mpsc::unbounded_channel();

        let inner = Arc::new(Inner {
            runner,
            settings: RwLock::new(settings),
            scheduler: FetchScheduler::new(done_tx),
            aggregator,
            entries: Mutex::new(HashMap::new()),
            changed_tx,
        });
        tokio::spawn(pump_fetch_results(Arc::downgrade(&inner), done_rx));

        (Self { inner }, changed_rx)
    }

    /// Snapshot of the effective settings
    pub fn settings(&self) -> Settings {
        self.inner.settings().clone()
    }

    /// Targets currently known to the service
    pub fn targets(&self) -> Vec<TargetId> {
        self.inner.entries().keys().cloned().collect()
    }

    /// A target's working directory changed. Discovers the enclosing
    /// repository, creating the target's poller on first use, and collects.
    pub async fn notify_root_changed(&self, target: &TargetId, cwd: &Path) {
        let root = match RepoRoot::discover(cwd) {
            Ok(root) => root,
            Err(e) => {
                log::warn!("{target}: could not inspect {}: {e}", cwd.display());
                None
            }
        };

        let entry = self.inner.entry_or_insert(target);
        let mut poller = entry.poller.lock().await;
        let reset = poller.set_root(root);
        let changed = self.inner.collect(&mut poller).await;
        if reset || changed {
            self.inner.publish(&entry, &poller);
        }
    }

    /// Re-run collection for a known target. Returns `true` if the published
    /// snapshot changed.
    pub async fn collect(&self, target: &TargetId) -> bool {
        let Some(entry) = self.inner.entry(target) else {
            log::debug!("{target}: collect requested for unknown target");
            return false;
        };
        let mut poller = entry.poller.lock().await;
        let changed = self.inner.collect(&mut poller).await;
        if changed {
            self.inner.publish(&entry, &poller);
        }
        changed
    }

    /// Forget a target. A collection already running for it finishes but
    /// publishes nothing.
    pub fn notify_target_ended(&self, target: &TargetId) {
        if self.inner.entries().remove(target).is_some() {
            log::debug!("{target}: ended");
        }
    }

    /// Apply the host's knobs and render the target's last snapshot
    pub fn request_render(&self, target: &TargetId, knobs: &HostKnobs) -> Rendering {
        let icons = {
            let mut settings = self.inner.settings_mut();
            if settings.apply_knobs(knobs) {
                log::debug!("Settings changed by host knobs");
                if knobs.debug.is_some() {
                    apply_log_level(settings.log_level());
                }
            }
            settings.icons.clone()
        };

        match self.snapshot(target) {
            Some(snapshot) => render(&snapshot, &icons),
            None => Rendering::empty(),
        }
    }

    /// Last published snapshot of a target
    pub fn snapshot(&self, target: &TargetId) -> Option<StatusSnapshot> {
        let entry = self.inner.entry(target)?;
        let published = lock(&entry.published).clone();
        published
    }

    /// Drop every target and abort running fetches
    pub fn shutdown(&self) {
        self.inner.scheduler.shutdown();
        self.inner.entries().clear();
    }
}

impl Inner {
    fn settings(&self) -> std::sync::RwLockReadGuard<'_, Settings> {
        self.settings.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn settings_mut(&self) -> std::sync::RwLockWriteGuard<'_, Settings> {
        self.settings.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<TargetId, Arc<Entry>>> {
        lock(&self.entries)
    }

    fn entry(&self, target: &TargetId) -> Option<Arc<Entry>> {
        self.entries().get(target).cloned()
    }

    fn entry_or_insert(&self, target: &TargetId) -> Arc<Entry> {
        let mut entries = self.entries();
        let entry = entries.entry(target.clone()).or_insert_with(|| {
            log::debug!("{target}: new poller");
            Arc::new(Entry {
                poller: tokio::sync::Mutex::new(Poller::new(target.clone())),
                published: Mutex::new(None),
            })
        });
        Arc::clone(entry)
    }

    fn is_live(&self, entry: &Arc<Entry>, target: &TargetId) -> bool {
        self.entries()
            .get(target)
            .is_some_and(|current| Arc::ptr_eq(current, entry))
    }

    /// One collection cycle with the current settings. Errors are logged and
    /// leave the previous snapshot in place.
    async fn collect(&self, poller: &mut Poller) -> bool {
        let (git, fetch_interval) = {
            let settings = self.settings();
            (
                GitCli::new(Arc::clone(&self.runner), settings.git_binary.clone()),
                settings.auto_fetch.then(|| settings.fetch_interval()),
            )
        };
        let ctx = CollectContext {
            git: &git,
            scheduler: &self.scheduler,
            aggregator: &self.aggregator,
            fetch_interval,
        };

        match poller.collect(&ctx).await {
            Ok(changed) => changed,
            Err(e) if e.is_configuration() => {
                log::error!("{}: {e}", poller.target());
                false
            }
            Err(e) => {
                log::warn!("{}: status collection failed: {e}", poller.target());
                false
            }
        }
    }

    fn publish(&self, entry: &Arc<Entry>, poller: &Poller) {
        let target = poller.target();
        if !self.is_live(entry, target) {
            log::debug!("{target}: not publishing for ended target");
            return;
        }
        *lock(&entry.published) = poller.snapshot().cloned();
        if self.changed_tx.send(target.clone()).is_err() {
            log::debug!("{target}: change notification dropped, no listener");
        }
    }

    async fn fetch_finished(&self, done: FetchDone) {
        log::debug!("Fetch {} in {} finished", done.id, done.root);
        let entries: Vec<Arc<Entry>> = self.entries().values().cloned().collect();
        for entry in entries {
            let mut poller = entry.poller.lock().await;
            if poller.fetch_finished(&done) && self.collect(&mut poller).await {
                self.publish(&entry, &poller);
            }
        }
    }
}

async fn pump_fetch_results(inner: Weak<Inner>, mut done_rx: mpsc::UnboundedReceiver<FetchDone>) {
    while let Some(done) = done_rx.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        inner.fetch_finished(done).await;
    }
    log::debug!("Fetch result pump stopped");
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
