//! Immutable status snapshots.
//!
//! A [`StatusSnapshot`] is built wholesale at the end of every successful
//! collection and compared by value against the previously published one;
//! equality is the only thing that decides whether the host re-renders.
//!
//! # Public API
//! - [`TargetId`]: Identifier of one watched host context (a terminal session)
//! - [`SpecialState`] / [`Progress`]: Multi-step operations in progress
//! - [`RepoStatus`]: Everything the probes report for one repository
//! - [`StatusSnapshot`]: Status plus the target, root and fetch indicator

use crate::core::error::Result;
use crate::core::git_status::WorkingTreeCounts;
use crate::core::repo::RepoRoot;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TargetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A multi-step operation that takes over the status line while it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialState {
    RebaseInteractive,
    RebaseMerge,
    Rebase,
    Am,
    AmOrRebase,
    Merging,
    CherryPicking,
    Reverting,
    Bisecting,
}

impl SpecialState {
    pub fn label(&self) -> &'static str {
        match self {
            SpecialState::RebaseInteractive => "REBASE-i",
            SpecialState::RebaseMerge => "REBASE-m",
            SpecialState::Rebase => "REBASE",
            SpecialState::Am => "AM",
            SpecialState::AmOrRebase => "AM/REBASE",
            SpecialState::Merging => "MERGING",
            SpecialState::CherryPicking => "CHERRY-PICKING",
            SpecialState::Reverting => "REVERTING",
            SpecialState::Bisecting => "BISECTING",
        }
    }
}

impl fmt::Display for SpecialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Step counter of a rebase or `am` session; step and total always travel together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Progress {
    pub step: u32,
    pub total: u32,
}

/// Output of the special-state probe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialStatus {
    pub state: Option<SpecialState>,
    pub progress: Option<Progress>,
}

impl SpecialStatus {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn plain(state: SpecialState) -> Self {
        Self {
            state: Some(state),
            progress: None,
        }
    }

    pub fn with_progress(state: SpecialState, step: u32, total: u32) -> Self {
        Self {
            state: Some(state),
            progress: Some(Progress { step, total }),
        }
    }
}

/// One probe's contribution to a [`RepoStatus`]. Each variant owns a
/// disjoint set of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartialStatus {
    WorkingTree(WorkingTreeCounts),
    Branch(String),
    Divergence { push: u32, pull: u32 },
    Stashes(u32),
    Special(SpecialStatus),
}

impl PartialStatus {
    pub fn field(&self) -> &'static str {
        match self {
            PartialStatus::WorkingTree(_) => "working_tree",
            PartialStatus::Branch(_) => "current_branch",
            PartialStatus::Divergence { .. } => "divergence",
            PartialStatus::Stashes(_) => "stash_count",
            PartialStatus::Special(_) => "special_state",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoStatus {
    pub dirty: bool,
    pub untracked: u32,
    pub modified: u32,
    pub staged: u32,
    pub deleted: u32,
    pub current_branch: String,
    pub push_count: u32,
    pub pull_count: u32,
    pub stash_count: u32,
    pub special: SpecialStatus,
}

impl RepoStatus {
    pub fn working_tree(&self) -> WorkingTreeCounts {
        WorkingTreeCounts {
            dirty: self.dirty,
            untracked: self.untracked,
            modified: self.modified,
            staged: self.staged,
            deleted: self.deleted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub target: TargetId,
    pub repo_root: Option<RepoRoot>,
    pub fetching: bool,
    /// `None` until the first collection for `repo_root` succeeds
    pub status: Option<RepoStatus>,
}

impl StatusSnapshot {
    /// The unpopulated snapshot published after a root change or for a
    /// directory outside any repository
    pub fn empty(target: TargetId, repo_root: Option<RepoRoot>) -> Self {
        Self {
            target,
            repo_root,
            fetching: false,
            status: None,
        }
    }

    pub fn collected(target: TargetId, repo_root: RepoRoot, fetching: bool, status: RepoStatus) -> Self {
        Self {
            target,
            repo_root: Some(repo_root),
            fetching,
            status: Some(status),
        }
    }

    pub fn is_populated(&self) -> bool {
        self.repo_root.is_some() && self.status.is_some()
    }

    /// Fixed snapshot used to preview the status line
    pub fn exemplar() -> Self {
        Self::collected(
            TargetId::new("exemplar"),
            RepoRoot::from_workdir("/path/to/repo"),
            false,
            RepoStatus {
                dirty: true,
                untracked: 2,
                modified: 3,
                staged: 10,
                deleted: 4,
                current_branch: "main".to_string(),
                push_count: 2,
                pull_count: 5,
                stash_count: 3,
                special: SpecialStatus::none(),
            },
        )
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a snapshot previously written by [`StatusSnapshot::to_json`].
    /// Anything that is not a JSON object yields `None`.
    pub fn from_json(json: &str) -> Result<Option<Self>> {
        if !json.trim_start().starts_with('{') {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(json)?))
    }
}
