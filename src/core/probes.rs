//! Read-only repository probes.
//!
//! Each [`Probe`] runs one independent query against a checkout and reports a
//! [`PartialStatus`] covering its own slice of the status. Probes share no state
//! and have no ordering between them, so the aggregator runs them concurrently.
//!
//! The set is declared once in [`default_probes`].

use crate::core::error::{Result, StatusError};
use crate::core::git_status::WorkingTreeCounts;
use crate::core::repo::RepoRoot;
use crate::core::runner::GitCli;
use crate::core::snapshot::{PartialStatus, Progress, SpecialState, SpecialStatus};
use futures_util::future::BoxFuture;
use std::path::Path;
use std::sync::Arc;

pub const STATUS_ARGS: &[&str] = &["status", "--porcelain", "--ignore-submodules", "-unormal"];
pub const BRANCH_ARGS: &[&str] = &["branch", "--show-current"];
pub const SHORT_HEAD_ARGS: &[&str] = &["rev-parse", "--short", "HEAD"];
pub const DIVERGENCE_ARGS: &[&str] = &["rev-list", "--left-right", "--count", "HEAD...@{u}"];
pub const STASH_ARGS: &[&str] = &["stash", "list"];

/// What a probe gets to look at
pub struct ProbeContext<'a> {
    pub git: &'a GitCli,
    pub root: &'a RepoRoot,
}

pub trait Probe: Send + Sync {
    fn name(&self) -> &'static str;

    fn run<'a>(&'a self, ctx: &'a ProbeContext<'a>) -> BoxFuture<'a, Result<PartialStatus>>;
}

/// The probes every collection cycle runs
pub fn default_probes() -> Vec<Arc<dyn Probe>> {
    vec![
        Arc::new(WorkingTreeProbe),
        Arc::new(BranchProbe),
        Arc::new(DivergenceProbe),
        Arc::new(StashProbe),
        Arc::new(SpecialStateProbe),
    ]
}

/// Untracked/modified/staged/deleted counts from `git status --porcelain`
pub struct WorkingTreeProbe;

impl Probe for WorkingTreeProbe {
    fn name(&self) -> &'static str {
        "working-tree"
    }

    fn run<'a>(&'a self, ctx: &'a ProbeContext<'a>) -> BoxFuture<'a, Result<PartialStatus>> {
        Box::pin(async move {
            let stdout = ctx
                .git
                .run_checked(self.name(), ctx.root.workdir(), STATUS_ARGS)
                .await?;
            Ok(PartialStatus::WorkingTree(WorkingTreeCounts::from_porcelain(
                &stdout,
            )))
        })
    }
}

/// Current branch name, or `[shortsha]` on a detached HEAD
pub struct BranchProbe;

impl Probe for BranchProbe {
    fn name(&self) -> &'static str {
        "branch"
    }

    fn run<'a>(&'a self, ctx: &'a ProbeContext<'a>) -> BoxFuture<'a, Result<PartialStatus>> {
        Box::pin(async move {
            let workdir = ctx.root.workdir();
            let branch = ctx.git.run(workdir, BRANCH_ARGS).await?;
            if branch.success() && !branch.stdout.trim().is_empty() {
                return Ok(PartialStatus::Branch(branch.stdout.trim().to_string()));
            }

            let head = ctx
                .git
                .run_checked(self.name(), workdir, SHORT_HEAD_ARGS)
                .await?;
            Ok(PartialStatus::Branch(format!("[{}]", head.trim())))
        })
    }
}

/// Ahead/behind counts against the upstream; `(0, 0)` without one
pub struct DivergenceProbe;

impl Probe for DivergenceProbe {
    fn name(&self) -> &'static str {
        "divergence"
    }

    fn run<'a>(&'a self, ctx: &'a ProbeContext<'a>) -> BoxFuture<'a, Result<PartialStatus>> {
        Box::pin(async move {
            let output = ctx.git.run(ctx.root.workdir(), DIVERGENCE_ARGS).await?;
            if !output.success() {
                log::debug!("{}: no upstream configured", ctx.root);
                return Ok(PartialStatus::Divergence { push: 0, pull: 0 });
            }
            let (push, pull) = parse_divergence(&output.stdout).unwrap_or_else(|| {
                log::warn!(
                    "{}: unexpected rev-list output {:?}",
                    ctx.root,
                    output.stdout.trim()
                );
                (0, 0)
            });
            Ok(PartialStatus::Divergence { push, pull })
        })
    }
}

fn parse_divergence(stdout: &str) -> Option<(u32, u32)> {
    let mut counts = stdout.split_whitespace().map(str::parse::<u32>);
    match (counts.next(), counts.next(), counts.next()) {
        (Some(Ok(push)), Some(Ok(pull)), None) => Some((push, pull)),
        _ => None,
    }
}

/// Number of stash entries
pub struct StashProbe;

impl Probe for StashProbe {
    fn name(&self) -> &'static str {
        "stashes"
    }

    fn run<'a>(&'a self, ctx: &'a ProbeContext<'a>) -> BoxFuture<'a, Result<PartialStatus>> {
        Box::pin(async move {
            let stdout = ctx
                .git
                .run_checked(self.name(), ctx.root.workdir(), STASH_ARGS)
                .await?;
            let count = stdout.lines().filter(|line| !line.trim().is_empty()).count();
            Ok(PartialStatus::Stashes(count as u32))
        })
    }
}

/// Rebase/am/merge/cherry-pick/revert/bisect detection from the marker files
/// git leaves in its control directory.
pub struct SpecialStateProbe;

impl Probe for SpecialStateProbe {
    fn name(&self) -> &'static str {
        "special-state"
    }

    fn run<'a>(&'a self, ctx: &'a ProbeContext<'a>) -> BoxFuture<'a, Result<PartialStatus>> {
        Box::pin(async move {
            let special = detect_special_state(ctx.root.git_dir()).await?;
            Ok(PartialStatus::Special(special))
        })
    }
}

/// Inspect `git_dir` in priority order; the first marker found wins.
pub async fn detect_special_state(git_dir: &Path) -> Result<SpecialStatus> {
    let rebase_merge = git_dir.join("rebase-merge");
    if is_dir(&rebase_merge).await {
        let state = if exists(&rebase_merge.join("interactive")).await {
            SpecialState::RebaseInteractive
        } else {
            SpecialState::RebaseMerge
        };
        let progress = read_progress(&rebase_merge.join("msgnum"), &rebase_merge.join("end")).await;
        return Ok(SpecialStatus {
            state: Some(state),
            progress,
        });
    }

    let rebase_apply = git_dir.join("rebase-apply");
    if is_dir(&rebase_apply).await {
        let progress = read_progress(&rebase_apply.join("next"), &rebase_apply.join("last")).await;
        let state = if exists(&rebase_apply.join("rebasing")).await {
            SpecialState::Rebase
        } else if exists(&rebase_apply.join("applying")).await {
            SpecialState::Am
        } else {
            SpecialState::AmOrRebase
        };
        return Ok(SpecialStatus {
            state: Some(state),
            progress,
        });
    }

    let markers = [
        ("MERGE_HEAD", SpecialState::Merging),
        ("CHERRY_PICK_HEAD", SpecialState::CherryPicking),
        ("REVERT_HEAD", SpecialState::Reverting),
        ("BISECT_LOG", SpecialState::Bisecting),
    ];
    for (marker, state) in markers {
        if exists(&git_dir.join(marker)).await {
            return Ok(SpecialStatus::plain(state));
        }
    }

    Ok(SpecialStatus::none())
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Step counter of a rebase or `am`. Missing or garbled step files only drop
/// the counter: `rebase-merge/msgnum` does not exist while the todo list of
/// an interactive rebase is being edited.
async fn read_progress(step_file: &Path, total_file: &Path) -> Option<Progress> {
    let step = read_first_line_int(step_file).await;
    let total = read_first_line_int(total_file).await;
    match (step, total) {
        (Ok(step), Ok(total)) => Some(Progress { step, total }),
        (Err(e), _) | (_, Err(e)) => {
            log::debug!("No progress counter: {e}");
            None
        }
    }
}

async fn read_first_line_int(path: &Path) -> Result<u32> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| StatusError::invalid_marker(path, e.to_string()))?;
    let first = content
        .lines()
        .next()
        .ok_or_else(|| StatusError::invalid_marker(path, "empty file"))?;
    first
        .trim()
        .parse()
        .map_err(|_| StatusError::invalid_marker(path, format!("not a number: {:?}", first.trim())))
}
