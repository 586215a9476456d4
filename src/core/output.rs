//! Colored output and progress reporting for gettext-dist
//!
//! Uses owo-colors for terminal colors and indicatif for progress bars.
//! Everything goes to stderr so stdout stays free for data such as version
//! listings.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;

/// Standard spinner characters
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Standard tick interval for spinners
const TICK_INTERVAL_MS: u64 = 80;

const BYTES_TEMPLATE: &str =
    "     {spinner:.cyan} [{bar:30.cyan/dim}] {bytes}/{total_bytes} ({eta})";

/// Print an action header (blue, bold)
/// Example: "==> Fetching gettext 0.26"
pub fn action(message: &str) {
    eprintln!("{} {}", "==>".blue().bold(), message.bold());
}

/// Print a sub-action (cyan arrow)
/// Example: "  -> signature"
pub fn sub_action(phase: &str) {
    eprintln!("  {} {}", "->".cyan(), phase);
}

/// Print a detail line (dimmed)
/// Example: "     trying https://ftp.gnu.org/gnu/gettext/gettext-0.26.tar.gz"
pub fn detail(message: &str) {
    eprintln!("     {}", message.dimmed());
}

/// Print a failed attempt before moving on to the next candidate
pub fn attempt_failed(candidate: &str, reason: &str) {
    eprintln!("     {} {}: {}", "✗".red(), candidate, reason.dimmed());
}

/// Print a success message (green)
pub fn success(message: &str) {
    eprintln!("{} {}", "==>".green().bold(), message.green());
}

/// Print an info message (cyan)
pub fn info(message: &str) {
    eprintln!("{} {}", "::".cyan(), message);
}

/// Print a warning message (yellow)
pub fn warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message.yellow());
}

/// Print a multi-line warning that is hard to miss.
///
/// Used when the trust gate lets an unverified tarball through.
pub fn loud_warning(lines: &[&str]) {
    let rule = "!".repeat(72);
    eprintln!("{}", rule.yellow().bold());
    for line in lines {
        eprintln!("{} {}", "warning:".yellow().bold(), line.yellow().bold());
    }
    eprintln!("{}", rule.yellow().bold());
}

/// Print an error message (red)
pub fn error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message.red());
}

fn spinner_style(template: &str) -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(SPINNER_CHARS)
}

/// Create a simple spinner for operations of unknown length
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style("     {spinner:.cyan} {msg}"));
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(TICK_INTERVAL_MS));
    pb
}

/// Create an indeterminate progress bar (spinner) for the build phase
pub fn build_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style("  {spinner:.cyan} {msg}"));
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(TICK_INTERVAL_MS));
    pb
}

/// Upgrade a spinner to a byte progress bar once the content length is known.
pub fn upgrade_to_bytes(pb: &ProgressBar, total_bytes: u64) {
    pb.set_length(total_bytes);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(BYTES_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸━"),
    );
}
