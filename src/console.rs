//! Console output formatting with ANSI color support.
//!
//! Used by the binary to print a sync summary. Colors are skipped when
//! `NO_COLOR` is set or stdout is not a terminal.

use crate::changes::ChangeKind;
use crate::library::SyncOutcome;
use std::io::{self, IsTerminal};

/// ANSI style codes for terminal formatting.
#[derive(Debug, Clone, Copy)]
pub enum Style {
    Bold,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    Gray,
}

impl Style {
    fn code(self) -> &'static str {
        match self {
            Style::Bold => "1",
            Style::Red => "31",
            Style::Green => "32",
            Style::Yellow => "33",
            Style::Blue => "34",
            Style::Magenta => "35",
            Style::Cyan => "36",
            Style::Gray => "90",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Console output handler with color support detection.
#[derive(Debug)]
pub struct Console {
    colors_enabled: bool,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    /// Creates a new Console instance, detecting color support.
    pub fn new() -> Self {
        let colors_enabled = std::env::var("NO_COLOR").is_err() && io::stdout().is_terminal();

        Self { colors_enabled }
    }

    /// Creates a Console with colors explicitly enabled or disabled.
    pub fn with_colors(enabled: bool) -> Self {
        Self {
            colors_enabled: enabled,
        }
    }

    /// Applies ANSI styles to text if colors are enabled.
    pub fn style(&self, text: &str, styles: &[Style]) -> String {
        if !self.colors_enabled || styles.is_empty() {
            return text.to_string();
        }

        let codes: Vec<&str> = styles.iter().map(|s| s.code()).collect();
        format!("\x1b[{}m{}{}", codes.join(";"), text, RESET)
    }

    /// Creates a colored label like `[NEW]`.
    pub fn label(&self, label: &str, color: Style) -> String {
        format!("[{}]", self.style(label, &[color, Style::Bold]))
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", self.label("INFO", Style::Blue), message);
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", self.label("OK", Style::Green), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", self.label("WARN", Style::Yellow), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", self.label("ERROR", Style::Red), message);
    }

    /// Prints a section header in magenta bold.
    pub fn section(&self, message: &str) {
        println!();
        println!("{}", self.style(message, &[Style::Magenta, Style::Bold]));
    }

    /// Formats one classified novel, e.g. `[UPDATED] Moon Rise (moon-rise)`.
    pub fn change_line(&self, kind: ChangeKind, title: &str, slug: &str) -> String {
        let label = match kind {
            ChangeKind::New => self.label("NEW", Style::Green),
            ChangeKind::Updated => self.label("UPDATED", Style::Cyan),
            ChangeKind::Unchanged => self.label("SAME", Style::Gray),
            ChangeKind::Removed => self.label("REMOVED", Style::Red),
        };
        format!("{} {} {}", label, title, self.style(&format!("({})", slug), &[Style::Gray]))
    }

    /// Formats the per-kind counts of a sync.
    pub fn summary_line(&self, outcome: &SyncOutcome) -> String {
        let changes = &outcome.changes;
        format!(
            "new: {}, updated: {}, unchanged: {}, removed: {}, skipped: {}",
            self.count(changes.new.len()),
            self.count(changes.updated.len()),
            self.count(changes.unchanged.len()),
            self.count(changes.removed.len()),
            self.count(outcome.skipped.len()),
        )
    }

    /// Prints the full report of a sync run.
    pub fn report(&self, outcome: &SyncOutcome) {
        self.section("Changes");
        let changes = &outcome.changes;
        let listed = [
            (ChangeKind::New, &changes.new),
            (ChangeKind::Updated, &changes.updated),
            (ChangeKind::Removed, &changes.removed),
        ];
        for (kind, slugs) in listed {
            for slug in slugs {
                let title = outcome
                    .novels
                    .get(slug)
                    .map(|n| n.title.as_str())
                    .unwrap_or(slug);
                println!("{}", self.change_line(kind, title, slug));
            }
        }

        for skipped in &outcome.skipped {
            self.warning(&format!("Skipped {}: {}", skipped.folder, skipped.error));
        }
        for error in &outcome.persist_errors {
            self.error(&error.to_string());
        }

        self.section("Summary");
        if outcome.is_up_to_date() {
            self.success("Library is up to date");
        }
        self.info(&self.summary_line(outcome));
    }

    fn count(&self, n: usize) -> String {
        self.style(&n.to_string(), &[Style::Green, Style::Bold])
    }
}
