//! Shared test utilities for the bibtag test suite.
//!
//! Provides parse shortcuts, entry builders, and lookups that panic with a
//! clear message on miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let (db, diags) = parse_resolved(&fixture("sample.bib"));
//! assert!(diags.is_empty());
//!
//! let knuth = find_entry(&db, "knuth:taocp1");
//! assert_eq!(knuth.local_value("year"), Some("1968"));
//! ```

use std::path::Path;

use crate::config::Limits;
use crate::database::Database;
use crate::diagnostics::Diagnostics;
use crate::types::{Entry, Field};

// =========================================================================
// Parsing
// =========================================================================

/// Read `fixtures/<name>` into a string.
pub fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read fixture {}: {e}", path.display()))
}

/// Parse with default limits, leaving cross-references unresolved.
pub fn parse(input: &str) -> (Database, Diagnostics) {
    let mut diags = Diagnostics::new();
    let db = Database::parse(input, &Limits::default(), &mut diags)
        .unwrap_or_else(|e| panic!("parse failed: {e}"));
    (db, diags)
}

/// Parse with default limits and resolve cross-references.
pub fn parse_resolved(input: &str) -> (Database, Diagnostics) {
    let (mut db, mut diags) = parse(input);
    db.resolve_crossrefs(&mut diags);
    (db, diags)
}

// =========================================================================
// Builders
// =========================================================================

/// Build a content entry from `(name, value)` pairs.
pub fn entry(entry_type: &str, tag: &str, fields: &[(&str, &str)]) -> Entry {
    Entry {
        leading_text: "\n\n".into(),
        entry_type: entry_type.into(),
        tag: tag.into(),
        fields: fields.iter().map(|(n, v)| Field::new(*n, *v)).collect(),
        ..Entry::default()
    }
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find a content entry by its current tag. Panics if not found.
pub fn find_entry<'a>(db: &'a Database, tag: &str) -> &'a Entry {
    db.entries.iter().find(|e| e.tag == tag).unwrap_or_else(|| {
        panic!(
            "entry '{tag}' not found. Available: {:?}",
            tags(db)
        )
    })
}

/// Current tags of all content entries, in order.
pub fn tags(db: &Database) -> Vec<&str> {
    db.entries.iter().map(|e| e.tag.as_str()).collect()
}
