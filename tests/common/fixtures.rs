//! Predefined repository scenarios

#![allow(dead_code)]

use super::repository::*;
use assert_cmd::Command;
use git_glance::core::error::Result;
use std::path::Path;

/// Scenario: committed files, two modified, two untracked, one staged addition
/// and one file deleted from the work tree.
///
/// Expected counts: modified 2, untracked 2, staged 1, deleted 1.
pub fn create_dirty_repo() -> Result<TestRepo> {
    let repo = setup_test_repo()?;

    create_test_files(&repo.path, &["file1.txt", "file2.txt", "file3.txt"])?;
    git_add(&repo.path, ".")?;
    git_commit(&repo.path, "Initial commit")?;

    modify_test_files(&repo.path, &["file1.txt", "file2.txt"])?;
    remove_file(&repo.path, "file3.txt")?;
    create_test_files(&repo.path, &["new1.txt", "new2.txt"])?;
    create_file(&repo.path, "staged.txt", "staged\n")?;
    git_add(&repo.path, "staged.txt")?;

    Ok(repo)
}

/// Scenario: clean work tree with `count` stash entries
pub fn create_repo_with_stashes(count: usize) -> Result<TestRepo> {
    let repo = setup_test_repo_with_initial_commit()?;
    for i in 0..count {
        create_file(&repo.path, "initial.txt", &format!("stashed change {i}\n"))?;
        git(&repo.path, &["stash", "--quiet"])?;
    }
    Ok(repo)
}

/// `git-glance` with settings isolated from the user's configuration
pub fn glance_cmd(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("git-glance").expect("git-glance binary is built");
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env("HOME", config_home)
        .env_remove("GIT_GLANCE_GIT")
        .env_remove("RUST_LOG");
    cmd
}

/// A repository tracking a local bare upstream that has gained one commit
/// the repository has not fetched yet.
pub struct BehindUpstream {
    pub repo: TestRepo,
    pub upstream: tempfile::TempDir,
    pub other: tempfile::TempDir,
}

/// Scenario: `main` tracks `origin/main`; origin is one commit ahead but the
/// repository's remote-tracking ref does not know that until it fetches.
pub fn create_repo_behind_upstream() -> Result<BehindUpstream> {
    let upstream = tempfile::TempDir::new()?;
    git(upstream.path(), &["init", "--quiet", "--bare"])?;
    git(upstream.path(), &["symbolic-ref", "HEAD", "refs/heads/main"])?;
    let upstream_url = upstream.path().to_string_lossy().into_owned();

    let repo = setup_test_repo_with_initial_commit()?;
    git(&repo.path, &["remote", "add", "origin", &upstream_url])?;
    git(&repo.path, &["push", "--quiet", "-u", "origin", "main"])?;

    let other = tempfile::TempDir::new()?;
    git(other.path(), &["clone", "--quiet", &upstream_url, "."])?;
    git(other.path(), &["config", "user.name", "Other User"])?;
    git(other.path(), &["config", "user.email", "other@example.com"])?;
    git(other.path(), &["config", "commit.gpgsign", "false"])?;
    create_file(other.path(), "upstream.txt", "from elsewhere\n")?;
    git_add(other.path(), "upstream.txt")?;
    git_commit(other.path(), "Upstream change")?;
    git(other.path(), &["push", "--quiet", "origin", "main"])?;

    Ok(BehindUpstream {
        repo,
        upstream,
        other,
    })
}

/// Where `git-glance` looks for its settings when run through [`glance_cmd`]
pub fn settings_dir(config_home: &Path) -> std::path::PathBuf {
    if cfg!(target_os = "macos") {
        config_home.join("Library/Application Support/git-glance")
    } else {
        config_home.join("git-glance")
    }
}
