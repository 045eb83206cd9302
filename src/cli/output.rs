//! Shared CLI output helpers.
//!
//! Color scheme (respects NO_COLOR and non-tty output):
//! - Green: success
//! - Red: errors, failed checks
//! - Yellow: warnings
//! - Cyan: paths, hints
//! - Dimmed: secondary info

use std::fmt::Display;

use console::{style, StyledObject};

const RULE_WIDTH: usize = 56;

fn styled<D>(value: D) -> StyledObject<D> {
    let s = style(value);
    if std::env::var_os("NO_COLOR").is_some() {
        s.force_styling(false)
    } else {
        s
    }
}

/// Print a success message with checkmark.
///
/// Example: `✓ built /tmp/ticket.pkpass`
pub fn success(msg: &str) {
    println!("{} {}", styled("✓").green(), msg);
}

/// Print an error message to stderr.
pub fn error(msg: &str) {
    eprintln!("{} {}", styled("✗").red(), msg);
}

/// Print a warning message to stderr.
pub fn warn(msg: &str) {
    eprintln!("{} {}", styled("⚠").yellow(), msg);
}

/// Print a hint to stderr.
///
/// Example: `→ install openssl or set [signing] openssl in pkpass.toml`
pub fn hint(msg: &str) {
    eprintln!("{} {}", styled("→").cyan(), styled(msg).cyan());
}

/// Print a key-value pair (label dimmed, value bold).
pub fn kv(label: &str, value: impl Display) {
    println!("  {}  {}", styled(label).dim(), styled(value.to_string()).bold());
}

/// Print a list item with bullet.
pub fn list_item(item: &str) {
    println!("  • {}", item);
}

/// Print a list item marked as failing a check.
pub fn list_problem(item: &str) {
    println!("  {} {}", styled("✗").red(), item);
}

/// Format a path in cyan.
pub fn path(p: impl Display) -> String {
    styled(p.to_string()).cyan().to_string()
}

/// Format secondary text.
pub fn dimmed(msg: impl Display) -> String {
    styled(msg.to_string()).dim().to_string()
}

/// Print a section header with a separator line.
///
/// Example:
/// ```text
/// Entries
/// ────────────────────────────────────────────────────────
/// ```
pub fn section(title: &str) {
    println!();
    println!("{}", styled(title).bold());
    println!("{}", styled("─".repeat(RULE_WIDTH)).dim());
}
