//! Per-target polling state.
//!
//! A [`Poller`] belongs to exactly one target. It remembers which repository
//! the target is in and the last snapshot it published, and decides on every
//! collection whether that snapshot changed. Callers serialize access to one
//! poller, so two collections for the same target never interleave.
//!
//! ```text
//! Idle ──root found──▶ Tracking ──root lost──▶ Idle
//!   └──────────── target ended (poller dropped) ────────────▶ done
//! ```

use crate::core::aggregator::SnapshotAggregator;
use crate::core::error::Result;
use crate::core::repo::RepoRoot;
use crate::core::runner::GitCli;
use crate::core::scheduler::{FetchDone, FetchScheduler, FetchTicket};
use crate::core::snapshot::{StatusSnapshot, TargetId};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerPhase {
    Idle,
    Tracking,
}

/// Shared collaborators one collection cycle needs
pub struct CollectContext<'a> {
    pub git: &'a GitCli,
    pub scheduler: &'a FetchScheduler,
    pub aggregator: &'a SnapshotAggregator,
    /// `None` disables background fetches
    pub fetch_interval: Option<Duration>,
}

#[derive(Debug)]
pub struct Poller {
    target: TargetId,
    current_root: Option<RepoRoot>,
    last_snapshot: Option<StatusSnapshot>,
    fetch_ticket: Option<FetchTicket>,
}

impl Poller {
    pub fn new(target: TargetId) -> Self {
        Self {
            target,
            current_root: None,
            last_snapshot: None,
            fetch_ticket: None,
        }
    }

    pub fn target(&self) -> &TargetId {
        &self.target
    }

    pub fn current_root(&self) -> Option<&RepoRoot> {
        self.current_root.as_ref()
    }

    pub fn snapshot(&self) -> Option<&StatusSnapshot> {
        self.last_snapshot.as_ref()
    }

    pub fn fetch_ticket(&self) -> Option<&FetchTicket> {
        self.fetch_ticket.as_ref()
    }

    pub fn phase(&self) -> PollerPhase {
        match self.current_root {
            Some(_) => PollerPhase::Tracking,
            None => PollerPhase::Idle,
        }
    }

    /// Point the poller at `root`. A different root discards the previous
    /// snapshot and this target's claim on any fetch; the scheduler's own
    /// per-root bookkeeping is untouched. Returns `true` on a change.
    pub fn set_root(&mut self, root: Option<RepoRoot>) -> bool {
        if root == self.current_root {
            return false;
        }
        log::debug!(
            "{}: root changed from {:?} to {:?}",
            self.target,
            self.current_root.as_ref().map(|r| r.to_string()),
            root.as_ref().map(|r| r.to_string())
        );
        self.last_snapshot = Some(StatusSnapshot::empty(self.target.clone(), root.clone()));
        self.current_root = root;
        self.fetch_ticket = None;
        true
    }

    /// React to a finished fetch. Returns `true` if this poller still tracks
    /// the fetched root and should collect again.
    pub fn fetch_finished(&mut self, done: &FetchDone) -> bool {
        if self.fetch_ticket.as_ref().is_some_and(|t| t.id == done.id) {
            self.fetch_ticket = None;
        }
        let current = self.current_root.as_ref() == Some(&done.root);
        if !current {
            log::debug!("{}: ignoring fetch result for {}", self.target, done.root);
        }
        current
    }

    /// Run one collection cycle. Returns `true` if a different snapshot
    /// was published. On error the previous snapshot stays in place.
    pub async fn collect(&mut self, ctx: &CollectContext<'_>) -> Result<bool> {
        let Some(root) = self.current_root.clone() else {
            log::debug!("{}: no repository", self.target);
            return Ok(self.publish(StatusSnapshot::empty(self.target.clone(), None)));
        };

        if let Some(interval) = ctx.fetch_interval {
            if let Some(ticket) = ctx
                .scheduler
                .maybe_start(ctx.git, &root, &self.target, interval)
                .await?
            {
                self.fetch_ticket = Some(ticket);
            }
        }

        let snapshot = ctx
            .aggregator
            .collect(ctx.git, ctx.scheduler, &self.target, &root)
            .await?;
        Ok(self.publish(snapshot))
    }

    fn publish(&mut self, snapshot: StatusSnapshot) -> bool {
        if self.last_snapshot.as_ref() == Some(&snapshot) {
            log::debug!("{}: snapshot unchanged", self.target);
            return false;
        }
        log::debug!("{}: publishing {:?}", self.target, snapshot);
        self.last_snapshot = Some(snapshot);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Icons;
    use crate::core::render::render;
    use crate::core::runner::testing::{self, ScriptedRunner};
    use crate::core::snapshot::RepoStatus;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    struct Harness {
        git: GitCli,
        scheduler: FetchScheduler,
        aggregator: SnapshotAggregator,
        done_rx: mpsc::UnboundedReceiver<FetchDone>,
        fetch_interval: Option<Duration>,
    }

    impl Harness {
        fn new(runner: Arc<ScriptedRunner>) -> Self {
            let (tx, done_rx) = mpsc::unbounded_channel();
            Self {
                git: testing::git_cli(runner),
                scheduler: FetchScheduler::new(tx),
                aggregator: SnapshotAggregator::default(),
                done_rx,
                fetch_interval: Some(Duration::from_secs(10)),
            }
        }

        fn ctx(&self) -> CollectContext<'_> {
            CollectContext {
                git: &self.git,
                scheduler: &self.scheduler,
                aggregator: &self.aggregator,
                fetch_interval: self.fetch_interval,
            }
        }
    }

    fn root(path: &str) -> RepoRoot {
        RepoRoot::from_workdir(path)
    }

    #[tokio::test]
    async fn test_starts_idle() {
        let poller = Poller::new(TargetId::from("t1"));
        assert_eq!(poller.phase(), PollerPhase::Idle);
        assert!(poller.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_collect_without_root_publishes_empty_once() -> anyhow::Result<()> {
        let harness = Harness::new(Arc::new(ScriptedRunner::clean_repo()));
        let mut poller = Poller::new(TargetId::from("t1"));

        assert!(poller.collect(&harness.ctx()).await?);
        let snapshot = poller.snapshot().expect("published");
        assert!(render(snapshot, &Icons::default()).is_empty());

        assert!(!poller.collect(&harness.ctx()).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_collect_is_idempotent() -> anyhow::Result<()> {
        let harness = Harness::new(Arc::new(ScriptedRunner::clean_repo()));
        let mut poller = Poller::new(TargetId::from("t1"));
        poller.set_root(Some(root("/r1")));
        assert_eq!(poller.phase(), PollerPhase::Tracking);

        assert!(poller.collect(&harness.ctx()).await?);
        let first = poller.snapshot().cloned();
        assert!(!poller.collect(&harness.ctx()).await?);
        assert_eq!(poller.snapshot().cloned(), first);
        Ok(())
    }

    #[tokio::test]
    async fn test_root_change_resets_snapshot() -> anyhow::Result<()> {
        let runner = Arc::new(ScriptedRunner::clean_repo());
        runner.respond(testing::STATUS, 0, "?? a.txt\n");
        runner.respond(testing::BRANCH, 0, "feature\n");
        runner.respond(testing::STASHES, 0, "stash@{0}: WIP\n");
        let harness = Harness::new(Arc::clone(&runner));
        let target = TargetId::from("A");
        let mut poller = Poller::new(target.clone());

        poller.set_root(Some(root("/r1")));
        poller.collect(&harness.ctx()).await?;
        assert_eq!(
            poller.snapshot().and_then(|s| s.status.as_ref()).map(|s| s.stash_count),
            Some(1)
        );

        assert!(poller.set_root(Some(root("/r2"))));
        assert_eq!(
            poller.snapshot(),
            Some(&StatusSnapshot::empty(target.clone(), Some(root("/r2"))))
        );

        runner.respond(testing::STATUS, 0, "");
        runner.respond(testing::BRANCH, 0, "main\n");
        runner.respond(testing::STASHES, 0, "");
        assert!(poller.collect(&harness.ctx()).await?);

        let expected = StatusSnapshot::collected(
            target,
            root("/r2"),
            false,
            RepoStatus {
                current_branch: "main".to_string(),
                ..Default::default()
            },
        );
        assert_eq!(poller.snapshot(), Some(&expected));
        Ok(())
    }

    #[tokio::test]
    async fn test_same_root_is_not_a_change() {
        let mut poller = Poller::new(TargetId::from("t1"));
        assert!(poller.set_root(Some(root("/r1"))));
        assert!(!poller.set_root(Some(root("/r1"))));
        assert!(poller.set_root(None));
        assert_eq!(poller.phase(), PollerPhase::Idle);
    }

    #[tokio::test]
    async fn test_failed_cycle_keeps_previous_snapshot() -> anyhow::Result<()> {
        let runner = Arc::new(ScriptedRunner::clean_repo());
        let harness = Harness::new(Arc::clone(&runner));
        let mut poller = Poller::new(TargetId::from("t1"));
        poller.set_root(Some(root("/r1")));
        poller.collect(&harness.ctx()).await?;
        let before = poller.snapshot().cloned();

        runner.respond(testing::STATUS, 128, "");
        assert!(poller.collect(&harness.ctx()).await.is_err());
        assert_eq!(poller.snapshot().cloned(), before);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_fetch_round_trip() -> anyhow::Result<()> {
        let (runner, gate) = ScriptedRunner::with_remote_and_gated_fetch();
        let mut harness = Harness::new(Arc::new(runner));
        let mut poller = Poller::new(TargetId::from("t1"));
        poller.set_root(Some(root("/r1")));

        assert!(poller.collect(&harness.ctx()).await?);
        assert!(poller.fetch_ticket().is_some());
        assert!(poller.snapshot().is_some_and(|s| s.fetching));

        gate.add_permits(1);
        let done = harness.done_rx.recv().await.expect("fetch completes");
        assert!(poller.fetch_finished(&done));
        assert!(poller.fetch_ticket().is_none());

        assert!(poller.collect(&harness.ctx()).await?);
        assert!(poller.snapshot().is_some_and(|s| !s.fetching));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_fetch_result_is_ignored() -> anyhow::Result<()> {
        let (runner, gate) = ScriptedRunner::with_remote_and_gated_fetch();
        let mut harness = Harness::new(Arc::new(runner));
        let mut poller = Poller::new(TargetId::from("t1"));
        poller.set_root(Some(root("/r1")));
        poller.collect(&harness.ctx()).await?;

        poller.set_root(Some(root("/r2")));
        assert!(poller.fetch_ticket().is_none());

        gate.add_permits(1);
        let done = harness.done_rx.recv().await.expect("fetch completes");
        assert!(!poller.fetch_finished(&done));
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_disabled() -> anyhow::Result<()> {
        let (runner, _gate) = ScriptedRunner::with_remote_and_gated_fetch();
        let runner = Arc::new(runner);
        let mut harness = Harness::new(Arc::clone(&runner));
        harness.fetch_interval = None;
        let mut poller = Poller::new(TargetId::from("t1"));
        poller.set_root(Some(root("/r1")));

        poller.collect(&harness.ctx()).await?;
        assert_eq!(runner.calls(testing::REMOTES), 0);
        assert!(poller.fetch_ticket().is_none());
        Ok(())
    }
}
