//! Terminal output utilities
//!
//! Provides consistent formatting for CLI output.

use owo_colors::OwoColorize;
use std::sync::atomic::{AtomicBool, Ordering};

static QUIET: AtomicBool = AtomicBool::new(false);

/// Suppress success/info/step output; errors and warnings still print
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        if !is_quiet() {
            println!("{} {}", "✓".green(), message);
        }
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        if !is_quiet() {
            println!("{} {}", "ℹ".blue(), message);
        }
    }

    /// Print a header
    pub fn header(message: &str) {
        if is_quiet() {
            return;
        }
        println!();
        println!("{}", message.bold());
        println!("{}", "─".repeat(message.chars().count()));
    }

    /// Print an aligned `label: value` line
    pub fn field(label: &str, value: &str) {
        println!("  {} {}", format!("{:<16}", format!("{}:", label)).dimmed(), value);
    }
}

/// Render an optional value, showing absence explicitly
pub fn format_optional(value: Option<&str>) -> String {
    match value {
        Some("") => "(empty)".to_string(),
        Some(v) => v.to_string(),
        None => "(absent)".to_string(),
    }
}

/// Render an optional secret without revealing it
pub fn format_secret(value: Option<&str>) -> String {
    match value {
        Some("") => "(empty)".to_string(),
        Some(_) => "********".to_string(),
        None => "(absent)".to_string(),
    }
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
