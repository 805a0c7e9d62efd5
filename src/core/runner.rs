//! External command execution.
//!
//! All repository truth comes from the git command line tool. [`CommandRunner`]
//! is the seam between the poller and the operating system: production code uses
//! [`ProcessRunner`], tests substitute a scripted runner. [`GitCli`] binds a
//! runner to a configured git binary and turns exit codes into typed errors.

use crate::core::error::{Result, StatusError};
use futures_util::future::BoxFuture;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

/// Everything needed to launch one external command
#[derive(Debug, Clone)]
pub struct CommandRequest<'a> {
    pub program: &'a Path,
    pub args: &'a [&'a str],
    pub cwd: &'a Path,
    /// Replacement `PATH` for the child, when the binary's directory must be on it
    pub path_env: Option<OsString>,
}

/// Captured result of an external command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::Output> for CommandOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

pub trait CommandRunner: Send + Sync {
    fn run<'a>(&'a self, request: CommandRequest<'a>) -> BoxFuture<'a, std::io::Result<CommandOutput>>;
}

#[derive(Debug, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run<'a>(&'a self, request: CommandRequest<'a>) -> BoxFuture<'a, std::io::Result<CommandOutput>> {
        Box::pin(async move {
            let mut cmd = tokio::process::Command::new(request.program);
            cmd.args(request.args)
                .current_dir(request.cwd)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());
            if let Some(path) = request.path_env {
                cmd.env("PATH", path);
            }
            Ok(cmd.output().await?.into())
        })
    }
}

/// A git binary plus the runner used to invoke it
#[derive(Clone)]
pub struct GitCli {
    runner: Arc<dyn CommandRunner>,
    binary: PathBuf,
}

impl GitCli {
    pub fn new(runner: Arc<dyn CommandRunner>, binary: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    /// Check that the configured binary exists, either as a file or on `PATH`.
    ///
    /// For absolute binaries the returned `PATH` has the binary's directory
    /// appended so helpers it spawns (credential helpers, ssh) resolve the same way.
    pub fn resolve(&self) -> Result<Option<OsString>> {
        if !self.binary.is_file() && find_on_path(&self.binary).is_none() {
            return Err(StatusError::git_binary_not_found(&self.binary));
        }

        if !self.binary.is_absolute() {
            return Ok(None);
        }

        let mut dirs: Vec<PathBuf> = std::env::var_os("PATH")
            .map(|path| std::env::split_paths(&path).collect())
            .unwrap_or_default();
        if let Some(parent) = self.binary.parent() {
            if !dirs.iter().any(|dir| dir == parent) {
                dirs.push(parent.to_path_buf());
            }
        }
        Ok(std::env::join_paths(dirs).ok())
    }

    /// Run git in `cwd`. Only configuration and spawn problems are errors;
    /// the exit code is left to the caller.
    pub async fn run(&self, cwd: &Path, args: &[&str]) -> Result<CommandOutput> {
        let path_env = self.resolve()?;
        log::debug!("Running git {} in {}", args.join(" "), cwd.display());

        let output = self
            .runner
            .run(CommandRequest {
                program: &self.binary,
                args,
                cwd,
                path_env,
            })
            .await
            .map_err(|e| StatusError::spawn_failed(&self.binary, args, e))?;

        log::debug!("git {} exited with {:?}", args.join(" "), output.code);
        if !output.stderr.trim().is_empty() {
            log::debug!("git {} stderr: {}", args.join(" "), output.stderr.trim());
        }
        Ok(output)
    }

    /// Run git and fail with [`StatusError::ProbeFailed`] on a non-zero exit
    pub async fn run_checked(&self, probe: &'static str, cwd: &Path, args: &[&str]) -> Result<String> {
        let output = self.run(cwd, args).await?;
        if output.success() {
            return Ok(output.stdout);
        }
        let captured = if output.stderr.trim().is_empty() {
            output.stdout
        } else {
            output.stderr
        };
        Err(StatusError::probe_failed(probe, args, output.code, captured))
    }
}

fn find_on_path(binary: &Path) -> Option<PathBuf> {
    if binary.components().count() != 1 {
        return None;
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}
