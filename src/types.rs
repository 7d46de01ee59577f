//! Shared types used across all pipeline stages.
//!
//! An [`Entry`] is built once by the parser, linked by the cross-reference
//! pass, mutated in place by tag generation and sorting, and finally consumed
//! by the writer. Field values are kept exactly as read: delimiters, brace
//! nesting and escape sequences all survive until output.

use serde::Serialize;

/// Name of the attribute that carries a replaced tag when history is saved.
pub const OLD_TAG: &str = "oldtag";
/// Name of the attribute that forces the final tag of an entry.
pub const NEW_TAG: &str = "newtag";
/// Name of the attribute linking an entry to its cross-reference target.
pub const CROSSREF: &str = "crossref";
/// Marker attribute that makes an entry a cross-reference target on its own.
pub const CROSSREF_ONLY: &str = "crossrefonly";

/// One `attribute = value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Attribute name as written in the input.
    pub name: String,
    /// Raw value text, delimiters included.
    pub value: String,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Case-insensitive attribute name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// How an entry is classified when the database is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// `@string` definition; body is an opaque token.
    String,
    /// `@preamble`; a file-wide singleton.
    Preamble,
    /// Every other record type.
    Content,
}

impl EntryKind {
    /// Classify a type token such as `@Article` or `@STRING`.
    pub fn of(entry_type: &str) -> Self {
        if entry_type.eq_ignore_ascii_case("@string") {
            EntryKind::String
        } else if entry_type.eq_ignore_ascii_case("@preamble") {
            EntryKind::Preamble
        } else {
            EntryKind::Content
        }
    }
}

/// One parsed record: a content entry, a string definition, or the preamble.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    /// Comments and blank lines preceding the entry, reproduced verbatim.
    pub leading_text: String,
    /// The type token including its boundary marker, e.g. `@article`.
    pub entry_type: String,
    /// Raw definition token for `@string` entries.
    pub string_definition: Option<String>,
    /// Citation key as read, or as replaced by tag generation.
    pub tag: String,
    /// Accumulated output of the tag-generation stages.
    pub computed_tag: Option<String>,
    /// Reserved slot written ahead of `fields` when tag history is saved.
    pub history: Option<Field>,
    /// Attribute/value pairs in input order.
    pub fields: Vec<Field>,
    /// Set when another entry references this one, or it carries `crossrefonly`.
    pub is_crossref_target: bool,
    /// Index of the cross-reference target in the content-entry sequence.
    pub crossref: Option<usize>,
}

impl Entry {
    pub fn kind(&self) -> EntryKind {
        EntryKind::of(&self.entry_type)
    }

    /// Number of field slots, counting the reserved history slot.
    pub fn field_slots(&self) -> usize {
        self.fields.len() + 1
    }

    /// Look up a field on this entry only, ignoring any cross-reference.
    pub fn local_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.is_named(name))
            .map(|f| f.value.as_str())
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.is_named(name))
    }
}

/// An entry viewed together with its cross-reference target.
///
/// Lookups fall back to the target exactly once; the target's own link is
/// never followed.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub entry: &'a Entry,
    pub target: Option<&'a Entry>,
}

impl<'a> Record<'a> {
    pub fn new(entry: &'a Entry, target: Option<&'a Entry>) -> Self {
        Self { entry, target }
    }

    /// Value of `name` on the entry, falling back to the cross-reference target.
    pub fn value(&self, name: &str) -> Option<&'a str> {
        self.entry
            .local_value(name)
            .or_else(|| self.target.and_then(|t| t.local_value(name)))
    }

    /// The tag accumulated so far, empty if no stage has run.
    pub fn current_tag(&self) -> &'a str {
        self.entry.computed_tag.as_deref().unwrap_or("")
    }
}

/// A tag replacement performed on a content entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rename {
    pub old: String,
    pub new: String,
}
