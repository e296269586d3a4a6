//! Terminal output for the command-line surface.
//!
//! Colors are only applied when stdout is a terminal.

use owo_colors::OwoColorize;
use std::io::IsTerminal;

use crate::config::Config;
use crate::pipeline::{DownloadError, DownloadOutcome, DownloadState, StatusEvent};

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Pending,
    Download,
    Search,
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Pending => "○",
        Status::Download => "↓",
        Status::Search => "🔍",
    }
}

/// Icon shown for a download phase
pub fn state_status(state: DownloadState) -> Status {
    match state {
        DownloadState::Resolving => Status::Search,
        DownloadState::Fetching => Status::Download,
        DownloadState::Done => Status::Success,
        DownloadState::Failed => Status::Error,
        DownloadState::Idle | DownloadState::Rendering | DownloadState::Packaging => {
            Status::Pending
        }
    }
}

/// Format a status line, colored when `color` is set.
pub fn format_status(status: Status, msg: &str, color: bool) -> String {
    let icon = status_icon(status);
    if !color {
        return format!("{} {}", icon, msg);
    }
    match status {
        Status::Success => format!("{} {}", icon.green().bold(), msg),
        Status::Error => format!("{} {}", icon.red().bold(), msg),
        Status::Warning => format!("{} {}", icon.yellow().bold(), msg),
        Status::Info => format!("{} {}", icon.cyan().bold(), msg),
        Status::Pending => format!("{} {}", icon.white().dimmed(), msg),
        Status::Download => format!("{} {}", icon.magenta(), msg),
        Status::Search => format!("{} {}", icon.yellow(), msg),
    }
}

/// Print a styled status message.
pub fn print_status(status: Status, msg: &str) {
    println!("{}", format_status(status, msg, is_terminal()));
}

/// Print a progress event from a running download.
pub fn print_event(event: &StatusEvent) {
    match event {
        StatusEvent::State(DownloadState::Done) | StatusEvent::State(DownloadState::Failed) => {}
        StatusEvent::State(state) => {
            let label = format!("{}...", capitalize(&state.to_string()));
            print_status(state_status(*state), &label);
        }
        StatusEvent::Info(message) => print_status(Status::Info, message),
        StatusEvent::Warning(message) => print_status(Status::Warning, message),
    }
}

/// Print a failed download with its heading.
pub fn print_error(err: &DownloadError) {
    let title = if is_terminal() {
        err.title().red().bold().to_string()
    } else {
        err.title().to_string()
    };
    eprintln!(
        "{}",
        format_status(Status::Error, &format!("{}: {}", title, err), is_terminal())
    );
}

/// Print the result of a finished download.
pub fn print_outcome(outcome: &DownloadOutcome) {
    print_status(Status::Success, &outcome.summary());

    let gallery = &outcome.gallery;
    if !gallery.empty {
        print_status(
            Status::Info,
            &format!("Saved {} gallery image(s)", gallery.saved.len()),
        );
    }
    if !gallery.skipped.is_empty() {
        print_status(
            Status::Warning,
            &format!("Skipped {} gallery image(s)", gallery.skipped.len()),
        );
    }
    if let Ok(meta) = std::fs::metadata(&outcome.bundle_path) {
        if meta.is_file() {
            print_status(Status::Info, &format!("Archive size: {}", format_file_size(meta.len())));
        }
    }
}

/// Print the effective settings, with the token masked.
pub fn print_config(config: &Config) {
    let settings = &config.settings;
    print_section("Settings");
    println!("  bundle_option     {}", settings.bundle_option);
    println!(
        "  output_directory  {}",
        settings
            .output_directory()
            .map(|dir| dir.display().to_string())
            .unwrap_or_else(|| "(not set)".to_string())
    );
    println!(
        "  api_token         {}",
        settings.api_token().map(mask_token).unwrap_or_else(|| "(not set)".to_string())
    );
    print_section("API");
    println!("  base_url          {}", config.api.base_url);
    println!("  user_agent        {}", config.api.user_agent);
    print_section("Logging");
    println!("  level             {}", config.logging.level);
}

/// Print a section header.
pub fn print_section(title: &str) {
    let line = format!("━━━ {} ━━━", title);
    println!();
    if is_terminal() {
        println!("{}", line.bold().cyan());
    } else {
        println!("{}", line);
    }
}

/// Welcome banner for the interactive prompt.
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("Chub Card Downloader v{}", version);
    println!("Type a card name or code to download it.");
    println!("Commands: :token <value>, :token clear, :dir <path>, :bundle folder|zip, :config, :quit");
    println!();
}

/// Keep the first and last four characters of a token.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

/// Get a human-readable file size.
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
