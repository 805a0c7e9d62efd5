//! Common assertion helpers for test output validation

#![allow(dead_code)]

use predicates::prelude::*;

pub fn not_in_git_repo() -> impl Predicate<str> {
    predicates::str::contains("Not in a git repository")
}

/// The rendered line for a clean checkout of `branch`
pub fn clean_branch_line(branch: &str) -> impl Predicate<str> {
    predicates::str::diff(format!("🟢 {branch}\n"))
}

pub fn has_counter(icon: &str, count: u32) -> impl Predicate<str> {
    predicates::str::contains(format!("{icon} {count}"))
}

pub fn has_special_state(label: &str) -> impl Predicate<str> {
    predicates::str::contains(format!("‼️ {label}"))
}
