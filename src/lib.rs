//! Git Glance - asynchronous git status for status bars and prompts.
//!
//! A host (terminal, status bar, prompt) reports which directory each of its
//! targets is in. git-glance finds the enclosing repository, runs a handful of
//! git queries concurrently, merges them into a [`StatusSnapshot`] and renders
//! a compact line of icons and counters. A background `git fetch` keeps the
//! ahead/behind counts fresh without ever blocking a render.
//!
//! # Public API
//! - [`StatusService`]: the long-lived entry point hosts talk to
//! - [`StatusSnapshot`] and [`render`]: the data and its text form
//! - [`Settings`] and [`HostKnobs`]: persisted and host-supplied configuration
//! - [`StatusError`]: the error type shared by every fallible operation

pub mod commands;
pub mod core;

pub use core::{
    exemplar_text,
    render,
    // Configuration
    HostKnobs,
    Icons,
    // Repository model
    RepoRoot,
    RepoStatus,
    Rendering,
    Result,
    Settings,
    SpecialState,
    // Error handling
    StatusError,
    // Hosting
    StatusService,
    StatusSnapshot,
    TargetId,
};
