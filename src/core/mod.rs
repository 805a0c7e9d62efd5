//! Core functionality for git-glance.
//!
//! Repository discovery, the git probes, snapshot aggregation, background
//! fetch scheduling, per-target polling and rendering all live here. The
//! [`service`] module ties them together for hosts.

pub mod aggregator;
pub mod config;
pub mod dirs;
pub mod error;
pub mod git_status;
pub mod output;
pub mod poller;
pub mod probes;
pub mod render;
pub mod repo;
pub mod runner;
pub mod scheduler;
pub mod service;
pub mod snapshot;

// === Error handling ===
pub use error::{Result, StatusError};

// === Settings ===
pub use config::{HostKnobs, Icons, Settings};

// === Repository model ===
pub use git_status::{ChangeKind, WorkingTreeCounts};
pub use repo::RepoRoot;
pub use snapshot::{
    PartialStatus, Progress, RepoStatus, SpecialState, SpecialStatus, StatusSnapshot, TargetId,
};

// === Collection ===
pub use aggregator::{merge, SnapshotAggregator};
pub use poller::{Poller, PollerPhase};
pub use probes::{default_probes, Probe, ProbeContext};
pub use runner::{CommandOutput, CommandRequest, CommandRunner, GitCli, ProcessRunner};
pub use scheduler::{FetchDone, FetchScheduler, FetchTicket};

// === Rendering and hosting ===
pub use render::{exemplar_text, render, Rendering};
pub use service::StatusService;

// === Output formatting ===
pub use output::{print_error, print_error_with_hint, print_info, print_success};
