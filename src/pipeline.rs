//! End-to-end runs.
//!
//! ```text
//! input text ─→ parse ─→ resolve crossrefs ─→ tag stages ─→ replace ─→ sort ─→ write
//! ```
//!
//! The whole database is parsed before any tag is computed, and nothing is
//! written until every stage has run. A fatal [`ParseError`] therefore never
//! leaves partial output behind.

use crate::config::BibtagConfig;
use crate::database::{Database, ParseError};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::sort::sort_entries;
use crate::tags::{TagGenerator, replace_tags};
use crate::types::Rename;
use crate::writer;
use std::io::{self, Read};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result of one run.
#[derive(Debug, Default)]
pub struct Outcome {
    /// The rewritten database; empty for a check-only run.
    pub output: String,
    pub renames: Vec<Rename>,
    pub diagnostics: Vec<Diagnostic>,
    /// Number of `@string` definitions read.
    pub strings: usize,
    /// Number of content entries read.
    pub entries: usize,
}

/// Parse, retag, sort and re-emit `input`.
pub fn run(input: &str, config: &BibtagConfig) -> Result<Outcome, RunError> {
    let mut diagnostics = Diagnostics::new();
    let mut db = load(input, config, &mut diagnostics)?;

    TagGenerator::new(&config.tag).run(&config.pipeline.stages, &mut db, &mut diagnostics);

    let output_config = &config.output;
    let history = output_config
        .save_old_tags
        .then(|| output_config.delimiters.delimiters());
    let renames = replace_tags(&mut db.entries, history);

    if output_config.sort {
        sort_entries(&mut db.entries, output_config.sort_seed);
    }

    Ok(Outcome {
        output: writer::to_string(&db, output_config),
        renames,
        strings: db.strings.len(),
        entries: db.entries.len(),
        diagnostics: diagnostics.into_vec(),
    })
}

/// Parse and resolve `input` without computing tags or writing anything.
pub fn check(input: &str, config: &BibtagConfig) -> Result<Outcome, RunError> {
    let mut diagnostics = Diagnostics::new();
    let db = load(input, config, &mut diagnostics)?;
    Ok(Outcome {
        strings: db.strings.len(),
        entries: db.entries.len(),
        diagnostics: diagnostics.into_vec(),
        ..Outcome::default()
    })
}

fn load(
    input: &str,
    config: &BibtagConfig,
    diagnostics: &mut Diagnostics,
) -> Result<Database, RunError> {
    let mut db = Database::parse(input, &config.limits, diagnostics)?;
    db.resolve_crossrefs(diagnostics);
    tracing::debug!(
        strings = db.strings.len(),
        entries = db.entries.len(),
        "database loaded"
    );
    Ok(db)
}

/// Read the named files as one database, or stdin when none are given.
pub fn read_inputs(paths: &[PathBuf]) -> Result<String, RunError> {
    if paths.is_empty() {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input)?;
        return Ok(input);
    }
    let mut parts = Vec::with_capacity(paths.len());
    for path in paths {
        tracing::debug!(path = %path.display(), "reading input");
        parts.push(std::fs::read_to_string(path)?);
    }
    Ok(concat_inputs(parts))
}

/// Join input texts, keeping each one's first record in column 1.
pub fn concat_inputs<I>(parts: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut joined = String::new();
    for part in parts {
        if !joined.is_empty() && !joined.ends_with('\n') {
            joined.push('\n');
        }
        joined.push_str(&part);
    }
    joined
}
