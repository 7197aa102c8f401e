//! Output formatting: table, JSON, YAML, plain.
//!
//! Lists go through `tabled`, structured formats through serde, and plain
//! prints one identifier per line for scripting.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use onevisitor_core::VisitorStatus;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};

// ── Color ────────────────────────────────────────────────────────────

/// Whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Applies the palette when color is on, passes text through otherwise.
#[derive(Debug, Clone, Copy)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(global: &GlobalOpts) -> Self {
        Self {
            enabled: should_color(&global.color),
        }
    }

    pub fn status(self, status: VisitorStatus) -> String {
        let label = status.to_string();
        if !self.enabled {
            return label;
        }
        match status {
            VisitorStatus::CheckedIn => label.green().to_string(),
            VisitorStatus::CheckedOut => label.dimmed().to_string(),
            VisitorStatus::Overdue | VisitorStatus::EmergencyUnknown | VisitorStatus::NoShow => {
                label.red().to_string()
            }
            VisitorStatus::PreRegistered | VisitorStatus::EmergencySafe => {
                label.yellow().to_string()
            }
            VisitorStatus::Unknown => label,
        }
    }

    pub fn flag(self, on: bool) -> String {
        match (on, self.enabled) {
            (true, true) => "yes".green().to_string(),
            (false, true) => "no".dimmed().to_string(),
            (true, false) => "yes".into(),
            (false, false) => "no".into(),
        }
    }

    pub fn heading(self, text: &str) -> String {
        if self.enabled {
            text.bold().to_string()
        } else {
            text.to_owned()
        }
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list in the chosen format. `to_row` builds table rows and
/// `id_fn` the plain-format line.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Plain => data.iter().map(id_fn).collect::<Vec<_>>().join("\n"),
        structured => render_structured(structured, data),
    }
}

/// Render one item. Tables use `detail_fn`, a hand-formatted block.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Plain => id_fn(data),
        structured => render_structured(structured, data),
    }
}

fn render_structured<T: Serialize + ?Sized>(format: &OutputFormat, data: &T) -> String {
    let rendered = match format {
        OutputFormat::JsonCompact => serde_json::to_string(data).map_err(|e| e.to_string()),
        OutputFormat::Yaml => serde_yaml::to_string(data).map_err(|e| e.to_string()),
        OutputFormat::Json | OutputFormat::Table | OutputFormat::Plain => {
            serde_json::to_string_pretty(data).map_err(|e| e.to_string())
        }
    };
    rendered.unwrap_or_else(|e| {
        tracing::error!("failed to serialize output: {e}");
        String::new()
    })
}

/// `key: value` lines with aligned keys, for detail views.
pub fn detail_block(pairs: &[(&str, String)]) -> String {
    let width = pairs.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    pairs
        .iter()
        .map(|(k, v)| format!("{k:>width$}: {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print to stdout unless quiet or empty.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Print a status line to stderr unless quiet.
pub fn note(global: &GlobalOpts, message: &str) {
    if !global.quiet {
        eprintln!("{message}");
    }
}
