// file: src/utils/logging.rs
// description: Tracing subscriber initialization with optional ANSI coloring

use colored::*;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// `RUST_LOG` wins when set; otherwise `info`, or `debug` with `verbose`.
pub fn init_logger(colored_output: bool, verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .compact()
        .with_ansi(colored_output);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

/// How a line of the run report or config check should be marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Every message for the query was posted.
    Posted,
    /// Needs attention: messages dropped after webhook retries, or a missing setting.
    Partial,
    /// The query used up its attempts.
    Abandoned,
    Note,
}

impl Status {
    fn marker(self) -> ColoredString {
        match self {
            Status::Posted => "✓".green().bold(),
            Status::Partial => "⚠".yellow().bold(),
            Status::Abandoned => "✗".red().bold(),
            Status::Note => "ℹ".blue().bold(),
        }
    }
}

/// One report line, optionally prefixed with the query it belongs to.
pub fn status_line(status: Status, query: Option<&str>, detail: &str) -> String {
    let text = match query {
        Some(query) => format!("[{}] {}", query, detail),
        None => detail.to_string(),
    };
    let text = match status {
        Status::Posted => text.green(),
        Status::Partial => text.yellow(),
        Status::Abandoned => text.red(),
        Status::Note => text.normal(),
    };
    format!("{} {}", status.marker(), text)
}

/// Masks all but the last four characters of a secret for display.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}
