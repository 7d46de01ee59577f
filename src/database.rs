//! In-memory database assembly and cross-reference resolution.
//!
//! Parsed entries are classified as they arrive:
//!
//! - `@preamble` is a file-wide singleton; a second one replaces the first.
//! - `@string` definitions are appended to [`Database::strings`].
//! - Everything else is appended to [`Database::entries`].
//!
//! Exceeding the string or entry limit is fatal for the whole run. Once all
//! entries exist, [`Database::resolve_crossrefs`] links each entry to the
//! target named by its `crossref` field.

use crate::config::Limits;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::parser::Parser;
use crate::types::{CROSSREF, Entry, EntryKind, Record};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("too many entries in database (limit {limit})")]
    TooManyEntries { limit: usize },
    #[error("too many string definitions (limit {limit})")]
    TooManyStrings { limit: usize },
}

#[derive(Debug, Clone, Default)]
pub struct Database {
    /// Free text before the first record.
    pub leading_text: String,
    pub preamble: Option<Entry>,
    pub strings: Vec<Entry>,
    pub entries: Vec<Entry>,
    /// Free text after the last record.
    pub trailing_text: String,
}

impl Database {
    /// Parse a whole database. Cross-references are not resolved yet.
    pub fn parse(
        input: &str,
        limits: &Limits,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self, ParseError> {
        let mut parser = Parser::new(input, limits.max_fields);
        let mut db = Database {
            leading_text: parser.take_leading_text(),
            ..Database::default()
        };
        while let Some(entry) = parser.next_entry(diagnostics) {
            db.add(entry, limits, diagnostics)?;
        }
        db.trailing_text = parser.take_trailing_text();
        Ok(db)
    }

    fn add(
        &mut self,
        entry: Entry,
        limits: &Limits,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), ParseError> {
        match entry.kind() {
            EntryKind::Preamble => {
                if self.preamble.is_some() {
                    diagnostics.push(Diagnostic::DuplicatePreamble);
                }
                self.preamble = Some(entry);
            }
            EntryKind::String => {
                if self.strings.len() >= limits.max_strings {
                    return Err(ParseError::TooManyStrings {
                        limit: limits.max_strings,
                    });
                }
                self.strings.push(entry);
            }
            EntryKind::Content => {
                if self.entries.len() >= limits.max_entries {
                    return Err(ParseError::TooManyEntries {
                        limit: limits.max_entries,
                    });
                }
                self.entries.push(entry);
            }
        }
        Ok(())
    }

    /// Link entries to the targets named by their `crossref` fields.
    ///
    /// Only entries after the referencing one are searched. A target matches
    /// when its tag equals the field value, or when the value with its
    /// delimiters stripped is a prefix of the tag; both comparisons ignore
    /// ASCII case. The first match wins.
    pub fn resolve_crossrefs(&mut self, diagnostics: &mut Diagnostics) {
        for i in 0..self.entries.len() {
            let references: Vec<String> = self.entries[i]
                .fields
                .iter()
                .filter(|f| f.is_named(CROSSREF))
                .map(|f| f.value.clone())
                .collect();
            for reference in references {
                let found = (i + 1..self.entries.len())
                    .find(|&k| crossref_matches(&reference, &self.entries[k].tag));
                match found {
                    Some(k) => {
                        self.entries[k].is_crossref_target = true;
                        self.entries[i].crossref = Some(k);
                    }
                    None => diagnostics.push(Diagnostic::UnresolvedCrossref {
                        tag: self.entries[i].tag.clone(),
                        target: reference,
                    }),
                }
            }
        }
    }

    /// View of content entry `index` with its cross-reference target.
    pub fn record(&self, index: usize) -> Record<'_> {
        let entry = &self.entries[index];
        let target = entry.crossref.and_then(|k| self.entries.get(k));
        Record::new(entry, target)
    }
}

fn crossref_matches(reference: &str, tag: &str) -> bool {
    if reference.eq_ignore_ascii_case(tag) {
        return true;
    }
    let mut chars = reference.chars();
    if chars.next().is_none() || chars.next_back().is_none() {
        return false;
    }
    let inner = chars.as_str();
    !inner.is_empty()
        && tag
            .get(..inner.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(inner))
}
