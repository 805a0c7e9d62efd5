//! Shared test utilities for git-glance integration tests
//!
//! All scenarios use real git repositories in temporary directories.

pub mod assertions;
pub mod fixtures;
pub mod repository;
