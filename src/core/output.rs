//! Human-facing CLI messages.
//!
//! Everything here goes to stderr: stdout carries status lines and JSON that
//! hosts parse, so decoration must never end up there.

use colored::*;

/// Prints an error message
///
/// # Format
/// ```text
/// ✕ Error: <message>
/// ```
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✕ Error:".red(), message.white());
}

/// Prints an error followed by a hint line in a muted color
pub fn print_error_with_hint(message: &str, hint: &str) {
    print_error(message);
    eprintln!("  {}", hint.bright_black());
}

pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.white());
}

pub fn print_info(message: &str) {
    eprintln!("{}", message.bright_black());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_error_does_not_panic() {
        print_error("Test error message");
        print_error_with_hint("git binary not found", "set GIT_GLANCE_GIT");
    }

    #[test]
    fn test_print_success_does_not_panic() {
        print_success("Settings saved");
    }

    #[test]
    fn test_print_info_does_not_panic() {
        print_info("Watching for commands on stdin");
    }
}
