//! Styled terminal output: status lines, section headers and a spinner
//! shown while a search is loading.

use owo_colors::OwoColorize;
use std::time::Duration;

use crate::controller::{SearchState, SearchStatus};

/// Message kinds for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Search,
}

/// Status icons for different message kinds.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Search => "🔍",
    }
}

/// Print a styled status message to stderr.
pub fn print_status(status: Status, msg: &str) {
    let icon = status_icon(status);
    match status {
        Status::Success => eprintln!("{} {}", icon.green().bold(), msg),
        Status::Error => eprintln!("{} {}", icon.red().bold(), msg),
        Status::Warning => eprintln!("{} {}", icon.yellow().bold(), msg),
        Status::Info => eprintln!("{} {}", icon.cyan().bold(), msg),
        Status::Search => eprintln!("{} {}", icon.yellow(), msg),
    }
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

/// Welcome banner for interactive mode.
pub fn print_banner() {
    println!();
    println!(
        "{} {}",
        "📚 Book Finder".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("Type words to search, or a command:");
    println!("  :title <text>   :author <text>   :subject <text>   :lang <code>");
    println!("  :years <from> <to>   :sort <mode>   :next   :prev   :page <n>");
    println!("  :clear   :help   :quit");
    println!();
}

/// One-line human description of a controller state.
pub fn describe_state(state: &SearchState) -> String {
    match state.status {
        SearchStatus::Idle => "Enter a title, author, subject or keywords to search".to_string(),
        SearchStatus::Loading => "Searching...".to_string(),
        SearchStatus::Success => format!(
            "Found {} results",
            format_number(state.num_found().unwrap_or(0))
        ),
        SearchStatus::Empty => "No books matched your search".to_string(),
        SearchStatus::Error => format!(
            "Search failed: {}",
            state.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

/// Print the status line for a settled state.
pub fn print_state(state: &SearchState) {
    let kind = match state.status {
        SearchStatus::Idle => Status::Info,
        SearchStatus::Loading => Status::Search,
        SearchStatus::Success => Status::Success,
        SearchStatus::Empty => Status::Warning,
        SearchStatus::Error => Status::Error,
    };
    print_status(kind, &describe_state(state));
}

/// Format a count with thousands separators.
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn spinner_style(template: &str, ticks: &str) -> indicatif::ProgressStyle {
    indicatif::ProgressStyle::with_template(template)
        .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner())
        .tick_chars(ticks)
}

/// A loading spinner with message.
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str) -> Self {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(spinner_style("{spinner:.cyan} {msg}", "⠁⠂⠄⡀⢀⠠⠐⠈ "));
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// Finish with success message.
    pub fn finish_with_success(&self, msg: &str) {
        self.pb.set_style(spinner_style("{spinner:.green} {msg}", "✓✓"));
        self.pb.finish_with_message(msg.to_string());
    }

    /// Finish with error message.
    pub fn finish_with_error(&self, msg: &str) {
        self.pb.set_style(spinner_style("{spinner:.red} {msg}", "✗✗"));
        self.pb.finish_with_message(msg.to_string());
    }

    /// Remove the spinner without a trailing message.
    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }
}
