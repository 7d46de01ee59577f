//! CLI notices and the JSON run report.
//!
//! The rewritten database is the only thing written to the data stream.
//! Everything meant for the person running the tool goes to stderr:
//!
//! ```text
//! x1 ==> Rivest92
//! x2 ==> Rivest92a
//! done (3 strings, 2 entries)
//! ```
//!
//! Diagnostics are not repeated here; they are logged through `tracing` when
//! they are recorded.
//!
//! # Architecture
//!
//! Each notice has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stderr. Format
//! functions are pure: no I/O, no side effects.

use crate::pipeline::{Outcome, RunError};
use crate::types::Rename;
use serde::Serialize;
use std::path::Path;

// ============================================================================
// Notices
// ============================================================================

/// One `old ==> new` line per replaced tag.
pub fn format_renames(renames: &[Rename]) -> Vec<String> {
    renames
        .iter()
        .map(|r| format!("{} ==> {}", r.old, r.new))
        .collect()
}

pub fn format_summary(outcome: &Outcome) -> String {
    format!(
        "done ({} strings, {} entries)",
        outcome.strings, outcome.entries
    )
}

pub fn format_tag_output(outcome: &Outcome) -> Vec<String> {
    let mut lines = format_renames(&outcome.renames);
    lines.push(format_summary(outcome));
    lines
}

pub fn print_tag_output(outcome: &Outcome) {
    for line in format_tag_output(outcome) {
        eprintln!("{}", line);
    }
}

pub fn format_check_output(outcome: &Outcome) -> Vec<String> {
    let mut lines = vec![format_summary(outcome)];
    match outcome.diagnostics.len() {
        0 => lines.push("no problems found".to_string()),
        1 => lines.push("1 problem found".to_string()),
        n => lines.push(format!("{n} problems found")),
    }
    lines
}

pub fn print_check_output(outcome: &Outcome) {
    for line in format_check_output(outcome) {
        eprintln!("{}", line);
    }
}

// ============================================================================
// JSON report
// ============================================================================

/// Machine-readable summary of a run.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub strings: usize,
    pub entries: usize,
    pub renames: &'a [Rename],
    pub diagnostics: Vec<String>,
}

impl<'a> RunReport<'a> {
    pub fn new(outcome: &'a Outcome) -> Self {
        Self {
            strings: outcome.strings,
            entries: outcome.entries,
            renames: &outcome.renames,
            diagnostics: outcome.diagnostics.iter().map(|d| d.to_string()).collect(),
        }
    }
}

/// Write `outcome` as pretty-printed JSON to `path`.
pub fn write_report(path: &Path, outcome: &Outcome) -> Result<(), RunError> {
    let json = serde_json::to_string_pretty(&RunReport::new(outcome))?;
    std::fs::write(path, json)?;
    Ok(())
}
