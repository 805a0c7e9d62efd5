//! Porcelain status code classification.
//!
//! `git status --porcelain` prints one line per changed path, starting with a
//! two-character code (`XY`): index state then work tree state. This module
//! maps those codes onto the counters the status line shows.
//!
//! # Public API
//! - [`ChangeKind`]: Which counters one path contributes to
//! - [`WorkingTreeCounts`]: Totals for a whole porcelain listing

use serde::{Deserialize, Serialize};

/// Counter contributions of a single porcelain entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// `??` path not known to git
    Untracked,
    /// `AM` added to the index, then modified again; counts as staged and modified
    StagedAndModified,
    /// ` M` modified in the work tree only
    Modified,
    /// ` D` deleted in the work tree only
    Deleted,
    /// `D?` deletion recorded in the index; counts as staged and deleted
    StagedDeletion,
    /// `A?`, `M?` change recorded in the index
    Staged,
    /// Anything else (renames, conflicts, type changes): dirty but not counted
    Other,
}

impl ChangeKind {
    /// Classify a porcelain code. The first matching rule wins, so `AM` is
    /// checked before the generic staged prefixes.
    pub fn from_code(code: &str) -> Self {
        match code {
            "??" => ChangeKind::Untracked,
            "AM" => ChangeKind::StagedAndModified,
            " M" => ChangeKind::Modified,
            " D" => ChangeKind::Deleted,
            _ => match code.as_bytes().first() {
                Some(b'D') => ChangeKind::StagedDeletion,
                Some(b'A' | b'M') => ChangeKind::Staged,
                _ => ChangeKind::Other,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingTreeCounts {
    pub dirty: bool,
    pub untracked: u32,
    pub modified: u32,
    pub staged: u32,
    pub deleted: u32,
}

impl WorkingTreeCounts {
    /// Fold a full porcelain listing into counts. Any listed path marks the
    /// tree dirty, even one that feeds no counter.
    pub fn from_porcelain(stdout: &str) -> Self {
        stdout
            .lines()
            .filter(|line| !line.is_empty())
            .fold(Self::default(), |mut counts, line| {
                counts.record(ChangeKind::from_code(line.get(0..2).unwrap_or(line)));
                counts
            })
    }

    pub fn record(&mut self, kind: ChangeKind) {
        self.dirty = true;
        match kind {
            ChangeKind::Untracked => self.untracked += 1,
            ChangeKind::StagedAndModified => {
                self.staged += 1;
                self.modified += 1;
            }
            ChangeKind::Modified => self.modified += 1,
            ChangeKind::Deleted => self.deleted += 1,
            ChangeKind::StagedDeletion => {
                self.staged += 1;
                self.deleted += 1;
            }
            ChangeKind::Staged => self.staged += 1,
            ChangeKind::Other => {}
        }
    }
}
