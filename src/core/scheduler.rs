//! Background fetch scheduling.
//!
//! Remote tracking data only changes when somebody fetches, so the poller
//! occasionally runs `git fetch` in the background. [`FetchScheduler`] keeps one
//! entry per repository root, shared by every target that watches that root:
//! at most one fetch is in flight per root, and a new one starts only after the
//! polling interval has elapsed since the previous start.
//!
//! A finished fetch clears its own entry and then reports through a
//! [`FetchDone`] message; it never blocks the collection that started it.

use crate::core::error::Result;
use crate::core::repo::RepoRoot;
use crate::core::runner::GitCli;
use crate::core::snapshot::TargetId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const REMOTE_ARGS: &[&str] = &["remote"];
pub const FETCH_ARGS: &[&str] = &["fetch", "--quiet"];

/// Handle a collection keeps for the fetch it started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub id: u64,
    pub root: RepoRoot,
}

/// Completion message of one background fetch
#[derive(Debug, Clone)]
pub struct FetchDone {
    pub id: u64,
    pub root: RepoRoot,
    /// Target whose collection started the fetch
    pub target: TargetId,
    /// Failure description, if the fetch did not succeed
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct FetchState {
    last_started: Option<Instant>,
    in_flight: Option<InFlight>,
}

#[derive(Debug)]
struct InFlight {
    id: u64,
    handle: JoinHandle<()>,
}

impl FetchState {
    fn is_due(&self, now: Instant, interval: Duration) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        match self.last_started {
            None => true,
            Some(last) => now.saturating_duration_since(last) > interval,
        }
    }
}

pub struct FetchScheduler {
    states: Arc<Mutex<HashMap<RepoRoot, FetchState>>>,
    next_id: AtomicU64,
    done_tx: mpsc::UnboundedSender<FetchDone>,
}

impl FetchScheduler {
    pub fn new(done_tx: mpsc::UnboundedSender<FetchDone>) -> Self {
        Self {
            states: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            done_tx,
        }
    }

    fn states(&self) -> MutexGuard<'_, HashMap<RepoRoot, FetchState>> {
        lock(&self.states)
    }

    /// Whether a fetch for `root` is currently running
    pub fn is_fetching(&self, root: &RepoRoot) -> bool {
        self.states()
            .get(root)
            .is_some_and(|state| state.in_flight.is_some())
    }

    /// Whether a fetch for `root` could start now
    pub fn is_due(&self, root: &RepoRoot, interval: Duration) -> bool {
        let now = Instant::now();
        self.states()
            .get(root)
            .map_or(true, |state| state.is_due(now, interval))
    }

    /// Start a background fetch for `root` if it is due and the repository
    /// has at least one remote.
    ///
    /// Only configuration problems are returned as errors; a failing remote
    /// listing simply means "nothing to fetch".
    pub async fn maybe_start(
        &self,
        git: &GitCli,
        root: &RepoRoot,
        target: &TargetId,
        interval: Duration,
    ) -> Result<Option<FetchTicket>> {
        if !self.is_due(root, interval) {
            return Ok(None);
        }

        let remotes = git.run(root.workdir(), REMOTE_ARGS).await?;
        if !remotes.success() || remotes.stdout.trim().is_empty() {
            log::debug!("{target}: {root} has no remotes, not fetching");
            return Ok(None);
        }

        Ok(self.try_start(git.clone(), root, target, interval))
    }

    /// Atomically re-check the gate, record the start time and spawn the fetch
    pub fn try_start(
        &self,
        git: GitCli,
        root: &RepoRoot,
        target: &TargetId,
        interval: Duration,
    ) -> Option<FetchTicket> {
        let mut states = self.states();
        let state = states.entry(root.clone()).or_default();
        let now = Instant::now();
        if !state.is_due(now, interval) {
            return None;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        state.last_started = Some(now);
        log::debug!("{target}: starting fetch {id} in {root}");

        let handle = tokio::spawn(run_fetch(
            git,
            Arc::clone(&self.states),
            self.done_tx.clone(),
            FetchDone {
                id,
                root: root.clone(),
                target: target.clone(),
                error: None,
            },
        ));
        state.in_flight = Some(InFlight { id, handle });

        Some(FetchTicket {
            id,
            root: root.clone(),
        })
    }

    /// Abort every running fetch. Aborted fetches send no [`FetchDone`].
    pub fn shutdown(&self) {
        for (root, state) in self.states().iter_mut() {
            if let Some(in_flight) = state.in_flight.take() {
                log::debug!("Aborting fetch {} in {root}", in_flight.id);
                in_flight.handle.abort();
            }
        }
    }
}

async fn run_fetch(
    git: GitCli,
    states: Arc<Mutex<HashMap<RepoRoot, FetchState>>>,
    done_tx: mpsc::UnboundedSender<FetchDone>,
    mut done: FetchDone,
) {
    if let Err(e) = git.run_checked("fetch", done.root.workdir(), FETCH_ARGS).await {
        log::warn!("{}: fetch in {} failed: {e}", done.target, done.root);
        done.error = Some(e.to_string());
    } else {
        log::debug!("{}: fetch {} in {} finished", done.target, done.id, done.root);
    }

    if let Some(state) = lock(&states).get_mut(&done.root) {
        if state.in_flight.as_ref().is_some_and(|f| f.id == done.id) {
            state.in_flight = None;
        }
    }

    if done_tx.send(done).is_err() {
        log::debug!("Fetch completion dropped, no listener");
    }
}

// A panic while holding the lock leaves the map itself consistent
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
