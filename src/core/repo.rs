//! Repository root discovery.
//!
//! A [`RepoRoot`] identifies one checkout: the work tree directory the git
//! queries run in, and the control directory the special-state markers live
//! in. For a plain clone the latter is `<root>/.git`; for linked worktrees it
//! points into the main repository.

use crate::core::error::Result;
use git2::Repository;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRoot {
    workdir: PathBuf,
    git_dir: PathBuf,
}

impl RepoRoot {
    pub fn new(workdir: impl Into<PathBuf>, git_dir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            git_dir: git_dir.into(),
        }
    }

    /// Root for a conventional layout with the control directory at `<workdir>/.git`
    pub fn from_workdir(workdir: impl Into<PathBuf>) -> Self {
        let workdir = workdir.into();
        let git_dir = workdir.join(".git");
        Self { workdir, git_dir }
    }

    /// Find the repository enclosing `dir`.
    ///
    /// Returns `Ok(None)` when `dir` is not under version control or belongs
    /// to a bare repository.
    pub fn discover<P: AsRef<Path>>(dir: P) -> Result<Option<Self>> {
        let repo = match Repository::discover(dir.as_ref()) {
            Ok(repo) => repo,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let Some(workdir) = repo.workdir() else {
            log::debug!("{} is a bare repository", repo.path().display());
            return Ok(None);
        };

        Ok(Some(Self::new(
            strip_trailing_separator(workdir),
            strip_trailing_separator(repo.path()),
        )))
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }
}

impl fmt::Display for RepoRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.workdir.display())
    }
}

// git2 reports directories with a trailing slash
fn strip_trailing_separator(path: &Path) -> PathBuf {
    path.components().collect()
}
