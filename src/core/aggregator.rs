//! Snapshot aggregation.
//!
//! Runs every registered probe concurrently against one root and folds the
//! partial results into a complete [`RepoStatus`]. A cycle either produces a
//! fully populated snapshot or an error; nothing in between is ever returned.

use crate::core::error::{Result, StatusError};
use crate::core::git_status::WorkingTreeCounts;
use crate::core::probes::{default_probes, Probe, ProbeContext};
use crate::core::repo::RepoRoot;
use crate::core::runner::GitCli;
use crate::core::scheduler::FetchScheduler;
use crate::core::snapshot::{PartialStatus, RepoStatus, SpecialStatus, StatusSnapshot, TargetId};
use futures_util::future::try_join_all;
use std::sync::Arc;

pub struct SnapshotAggregator {
    probes: Vec<Arc<dyn Probe>>,
}

impl Default for SnapshotAggregator {
    fn default() -> Self {
        Self::new(default_probes())
    }
}

impl SnapshotAggregator {
    pub fn new(probes: Vec<Arc<dyn Probe>>) -> Self {
        Self { probes }
    }

    /// Run all probes for `root` and build the candidate snapshot.
    ///
    /// The `fetching` flag is read before the probes run, so a snapshot that
    /// reports no fetch was collected entirely after any earlier fetch ended.
    pub async fn collect(
        &self,
        git: &GitCli,
        scheduler: &FetchScheduler,
        target: &TargetId,
        root: &RepoRoot,
    ) -> Result<StatusSnapshot> {
        let ctx = ProbeContext { git, root };
        let fetching = scheduler.is_fetching(root);
        log::debug!("{target}: running {} probes in {root}", self.probes.len());

        let parts = try_join_all(self.probes.iter().map(|probe| probe.run(&ctx))).await?;
        let status = merge(parts)?;
        log::debug!("{target}: collected {status:?}");

        Ok(StatusSnapshot::collected(
            target.clone(),
            root.clone(),
            fetching,
            status,
        ))
    }
}

#[derive(Default)]
struct Accumulator {
    working_tree: Option<WorkingTreeCounts>,
    branch: Option<String>,
    divergence: Option<(u32, u32)>,
    stashes: Option<u32>,
    special: Option<SpecialStatus>,
}

fn fill<T>(slot: &mut Option<T>, value: T, field: &'static str) -> Result<()> {
    if slot.is_some() {
        return Err(StatusError::FieldConflict { field });
    }
    *slot = Some(value);
    Ok(())
}

fn require<T>(slot: Option<T>, field: &'static str) -> Result<T> {
    slot.ok_or(StatusError::MissingField { field })
}

/// Union of disjoint partial results. Order does not matter; a field
/// reported twice or never is an error.
pub fn merge(parts: impl IntoIterator<Item = PartialStatus>) -> Result<RepoStatus> {
    let mut acc = Accumulator::default();
    for part in parts {
        let field = part.field();
        match part {
            PartialStatus::WorkingTree(counts) => fill(&mut acc.working_tree, counts, field)?,
            PartialStatus::Branch(name) => fill(&mut acc.branch, name, field)?,
            PartialStatus::Divergence { push, pull } => {
                fill(&mut acc.divergence, (push, pull), field)?
            }
            PartialStatus::Stashes(count) => fill(&mut acc.stashes, count, field)?,
            PartialStatus::Special(special) => fill(&mut acc.special, special, field)?,
        }
    }

    let counts = require(acc.working_tree, "working_tree")?;
    let (push_count, pull_count) = require(acc.divergence, "divergence")?;
    Ok(RepoStatus {
        dirty: counts.dirty,
        untracked: counts.untracked,
        modified: counts.modified,
        staged: counts.staged,
        deleted: counts.deleted,
        current_branch: require(acc.branch, "current_branch")?,
        push_count,
        pull_count,
        stash_count: require(acc.stashes, "stash_count")?,
        special: require(acc.special, "special_state")?,
    })
}
