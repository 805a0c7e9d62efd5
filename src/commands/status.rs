use crate::core::{
    config::Settings,
    error::{Result, StatusError},
    render::render,
    runner::{GitCli, ProcessRunner},
    service::StatusService,
    snapshot::TargetId,
};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on how long `--fetch` waits for the refreshed snapshot
const FETCH_WAIT: Duration = Duration::from_secs(30);

const STATUS_TARGET: &str = "status";

#[derive(Debug, Clone, Default)]
pub struct StatusOptions {
    pub path: Option<PathBuf>,
    pub json: bool,
    pub all: bool,
    pub fetch: bool,
}

pub async fn execute_status(options: StatusOptions, mut settings: Settings) -> Result<()> {
    let path = match options.path {
        Some(path) => path,
        None => env::current_dir()?,
    };

    // Surface a missing git binary as an error rather than an empty line
    GitCli::new(Arc::new(ProcessRunner), settings.git_binary.clone()).resolve()?;

    settings.auto_fetch = options.fetch;
    let (service, mut changed) = StatusService::with_settings(settings);
    let target = TargetId::from(STATUS_TARGET);

    service.notify_root_changed(&target, &path).await;

    if options.fetch {
        let fetching = || service.snapshot(&target).is_some_and(|s| s.fetching);
        let refreshed = async {
            while fetching() {
                if changed.recv().await.is_none() {
                    break;
                }
            }
        };
        if tokio::time::timeout(FETCH_WAIT, refreshed).await.is_err() {
            log::warn!("Fetch still running after {FETCH_WAIT:?}, showing the earlier status");
        }
    }

    let snapshot = service.snapshot(&target);
    service.shutdown();

    let Some(snapshot) = snapshot.filter(|s| s.repo_root.is_some()) else {
        return Err(StatusError::NotInRepository { path });
    };
    if !snapshot.is_populated() {
        return Err(StatusError::StatusUnavailable { path });
    }

    if options.json {
        println!("{}", snapshot.to_json()?);
        return Ok(());
    }

    let rendering = render(&snapshot, &service.settings().icons);
    if options.all {
        for candidate in rendering.candidates() {
            println!("{candidate}");
        }
    } else {
        println!("{}", rendering.full());
    }
    Ok(())
}
