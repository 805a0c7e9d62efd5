//! Line protocol for long-running hosts.
//!
//! Commands arrive on stdin, one per line:
//!
//! ```text
//! cd <target> <path>          the target's working directory is now <path>
//! render <target> [<knobs>]   print the target's line, applying optional JSON knobs
//! end <target>                the target went away
//! ```
//!
//! Every change notification, and every `render`, prints `<target>\t<line>`
//! on stdout. Pending notifications are printed before the next command is
//! read. The loop ends when stdin closes.

use crate::core::{
    config::{HostKnobs, Settings},
    error::{Result, StatusError},
    output::{print_error, print_info},
    service::StatusService,
    snapshot::TargetId,
};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchCommand {
    Cd { target: TargetId, path: PathBuf },
    Render { target: TargetId, knobs: HostKnobs },
    End { target: TargetId },
}

impl WatchCommand {
    /// Parse one protocol line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let mut parts = line.splitn(3, char::is_whitespace);
        let command = parts.next().unwrap_or_default();
        let target = parts
            .next()
            .filter(|t| !t.is_empty())
            .map(TargetId::from)
            .ok_or_else(|| StatusError::invalid_command(line, "missing target"))?;
        let rest = parts.next().map(str::trim).filter(|r| !r.is_empty());

        let parsed = match (command, rest) {
            ("cd", Some(path)) => Self::Cd {
                target,
                path: PathBuf::from(path),
            },
            ("cd", None) => return Err(StatusError::invalid_command(line, "missing path")),
            ("render", None) => Self::Render {
                target,
                knobs: HostKnobs::default(),
            },
            ("render", Some(json)) => Self::Render {
                target,
                knobs: serde_json::from_str(json)
                    .map_err(|e| StatusError::invalid_command(line, e.to_string()))?,
            },
            ("end", None) => Self::End { target },
            ("end", Some(_)) => {
                return Err(StatusError::invalid_command(line, "unexpected argument"))
            }
            _ => return Err(StatusError::invalid_command(line, "unknown command")),
        };
        Ok(Some(parsed))
    }
}

pub async fn execute_watch(settings: Settings) -> Result<()> {
    let (service, mut changed) = StatusService::with_settings(settings);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_info("Watching for commands on stdin");

    loop {
        tokio::select! {
            biased;

            Some(target) = changed.recv() => {
                print_line(&service, &target, &HostKnobs::default());
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match WatchCommand::parse(&line) {
                    Ok(Some(command)) => handle(&service, command).await,
                    Ok(None) => {}
                    Err(e) => print_error(&e.to_string()),
                }
            }
        }
    }

    log::debug!("stdin closed, shutting down");
    service.shutdown();
    Ok(())
}

async fn handle(service: &StatusService, command: WatchCommand) {
    match command {
        WatchCommand::Cd { target, path } => service.notify_root_changed(&target, &path).await,
        WatchCommand::Render { target, knobs } => print_line(service, &target, &knobs),
        WatchCommand::End { target } => service.notify_target_ended(&target),
    }
}

fn print_line(service: &StatusService, target: &TargetId, knobs: &HostKnobs) {
    let rendering = service.request_render(target, knobs);
    println!("{target}\t{}", rendering.full());
}
