//! Terminal host for the command-line client.
//!
//! [`TerminalHost`] implements the progress and result sinks: status lines
//! and messages go to stderr, delivery progress drives a progress bar, and
//! collected entries can be rendered as a table, JSON or BibTeX.

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Table};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::sync::Mutex;

use crate::models::Entry;
use crate::search::{ProgressSink, ResultSink, Severity};

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Icon printed in front of a message.
pub fn severity_icon(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "ℹ",
        Severity::Warning => "⚠",
        Severity::Error => "✗",
    }
}

/// Progress and result sink that talks to the terminal.
#[derive(Default)]
pub struct TerminalHost {
    quiet: bool,
    bar: Mutex<Option<ProgressBar>>,
    entries: Mutex<Vec<Entry>>,
}

impl TerminalHost {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            ..Self::default()
        }
    }

    /// Entries delivered so far.
    pub fn entries(&self) -> Vec<Entry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn new_bar(total: usize) -> ProgressBar {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}") {
            bar.set_style(style);
        }
        bar
    }
}

impl ProgressSink for TerminalHost {
    fn set_status(&self, status: &str) {
        if !self.quiet {
            eprintln!("{} {}", "🔍".yellow(), status);
        }
    }

    fn set_progress(&self, current: usize, total: usize) {
        if self.quiet {
            return;
        }
        let Ok(mut slot) = self.bar.lock() else {
            return;
        };

        let bar = slot.get_or_insert_with(|| Self::new_bar(total));
        bar.set_position(current as u64);
        if current >= total {
            bar.finish_and_clear();
            *slot = None;
        }
    }

    fn show_message(&self, message: &str, severity: Severity) {
        let icon = severity_icon(severity);
        match severity {
            Severity::Info if !self.quiet => eprintln!("{} {}", icon.cyan().bold(), message),
            Severity::Info => {}
            Severity::Warning => eprintln!("{} {}", icon.yellow().bold(), message),
            Severity::Error => eprintln!("{} {}", icon.red().bold(), message),
        }
    }
}

impl ResultSink for TerminalHost {
    fn add_entry(&self, entry: Entry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", cut)
}

/// Render entries as a table of key, type, authors, title and year.
pub fn render_table(entries: &[Entry]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Key", "Type", "Authors", "Title", "Year"]);

    for entry in entries {
        table.add_row(vec![
            Cell::new(&entry.key),
            Cell::new(&entry.entry_type),
            Cell::new(truncate(entry.author().unwrap_or_default(), 30)),
            Cell::new(truncate(entry.title().unwrap_or_default(), 50)).add_attribute(Attribute::Bold),
            Cell::new(entry.year().unwrap_or_default()),
        ]);
    }
    table.to_string()
}

/// Render entries as BibTeX, separated by blank lines.
pub fn render_bibtex(entries: &[Entry]) -> String {
    entries
        .iter()
        .map(Entry::to_bibtex)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render entries as pretty-printed JSON.
pub fn render_json(entries: &[Entry]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(entries)
}
