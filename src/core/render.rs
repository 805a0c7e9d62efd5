//! Status line rendering.
//!
//! [`render`] is a pure function of a snapshot and the icon set. Its result
//! lists every truncated prefix of the segment list, shortest first, so a host
//! short on space can pick the longest candidate that fits; the last candidate
//! is the complete line.

use crate::core::config::Icons;
use crate::core::snapshot::{RepoStatus, StatusSnapshot};

/// Candidate display strings, shortest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendering {
    candidates: Vec<String>,
}

impl Rendering {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// The complete rendering, or `""` when there is nothing to show
    pub fn full(&self) -> &str {
        self.candidates.last().map(String::as_str).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

pub fn render(snapshot: &StatusSnapshot, icons: &Icons) -> Rendering {
    let (Some(_), Some(status)) = (&snapshot.repo_root, &snapshot.status) else {
        return Rendering::empty();
    };

    if let Some(state) = status.special.state {
        let mut line = format!("{} {}", icons.status_other, state.label());
        if let Some(progress) = status.special.progress {
            line.push_str(&format!(" ({}/{})", progress.step, progress.total));
        }
        return Rendering {
            candidates: vec![line],
        };
    }

    let segments: Vec<String> = [
        branch_segment(status, snapshot.fetching, icons),
        working_tree_segment(status, icons),
        index_segment(status, icons),
    ]
    .into_iter()
    .filter(|segment| !segment.is_empty())
    .collect();

    let candidates = (1..=segments.len())
        .map(|len| segments[..len].join(&icons.separator))
        .collect();
    Rendering { candidates }
}

/// Preview text built from [`StatusSnapshot::exemplar`]
pub fn exemplar_text(icons: &Icons) -> String {
    render(&StatusSnapshot::exemplar(), icons).full().to_string()
}

fn counter(out: &mut String, icon: &str, count: u32) {
    if count > 0 {
        out.push_str(&format!(" {icon} {count}"));
    }
}

fn branch_segment(status: &RepoStatus, fetching: bool, icons: &Icons) -> String {
    let state_icon = if status.dirty {
        &icons.status_dirty
    } else if status.push_count > 0 || status.pull_count > 0 {
        &icons.status_push_or_pull
    } else {
        &icons.status_clean
    };

    let mut segment = String::new();
    if fetching {
        segment.push_str(&icons.fetching);
        segment.push(' ');
    }
    segment.push_str(&format!("{state_icon} {}", status.current_branch));
    counter(&mut segment, &icons.push_count, status.push_count);
    counter(&mut segment, &icons.pull_count, status.pull_count);
    segment.trim().to_string()
}

fn working_tree_segment(status: &RepoStatus, icons: &Icons) -> String {
    let mut segment = String::new();
    counter(&mut segment, &icons.modified_count, status.modified);
    counter(&mut segment, &icons.untracked_count, status.untracked);
    counter(&mut segment, &icons.deleted_count, status.deleted);
    segment.trim().to_string()
}

fn index_segment(status: &RepoStatus, icons: &Icons) -> String {
    let mut segment = String::new();
    counter(&mut segment, &icons.staged_count, status.staged);
    counter(&mut segment, &icons.stashes_count, status.stash_count);
    segment.trim().to_string()
}
