//! # bibtag
//!
//! Recomputes canonical citation tags for a bibliographic database and
//! rewrites the database in a normalized layout. Comments and free text
//! between records survive untouched; only tags and formatting change.
//!
//! # Pipeline
//!
//! | Step | Module | Input | Output |
//! |------|--------|-------|--------|
//! | Parse | [`lexer`], [`parser`], [`database`] | database text | [`database::Database`] |
//! | Link | [`database`] | `crossref` fields | entry → target indices |
//! | Tag | [`tags`], [`naming`], [`registry`] | configured [`tags::Stage`]s | computed tags |
//! | Replace | [`tags`] | computed tags, `newtag` fields | renamed entries |
//! | Sort | [`sort`] | entries | non-targets first, then by tag |
//! | Write | [`writer`] | database | normalized text |
//!
//! [`pipeline::run`] drives the steps in order; [`config`] holds every
//! tunable bound, and [`output`] formats the notices the CLI prints.
//!
//! # Design Decisions
//!
//! ## Records Survive Verbatim
//!
//! Field values keep their delimiters, brace nesting, escape sequences and
//! `#` concatenations exactly as read. Nothing is unescaped or expanded;
//! the writer only collapses whitespace and wraps long lines. `@string`
//! bodies are opaque and written back unchanged.
//!
//! ## Tags Are a Fold Over Stages
//!
//! Every stage takes the tag built so far and returns the next one. Stages
//! run over all entries before the next stage starts, and the uniqueness
//! stage is the only one with shared state: an approximate registry of
//! tags already handed out. Suffix assignment therefore depends on file
//! order, and two runs over the same input give the same tags.
//!
//! ## Cross-Reference Targets Keep Their Tags
//!
//! An entry named by another entry's `crossref` field, or one carrying a
//! `crossrefonly` field, is never renamed, since renaming it would break
//! every reference to it. Targets are also written after all other
//! entries so BibTeX sees them last.
//!
//! ## Broken Records Are Dropped, Not Fatal
//!
//! An unterminated string or an entry with too many fields costs that entry
//! only. Parsing skips to the next `@` in column 1 and carries on; the
//! problem is reported as a diagnostic. Only the file-wide entry and string
//! limits abort a run, and they do so before anything is written.

pub mod config;
pub mod database;
pub mod diagnostics;
pub mod lexer;
pub mod naming;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod registry;
pub mod sort;
pub mod tags;
pub mod types;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_helpers;
