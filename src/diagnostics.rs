//! Non-fatal diagnostics.
//!
//! Data-quality problems never abort a run. They are collected here so the
//! caller can inspect or report them, and each one is logged through
//! `tracing` as it is recorded so it reaches the message stream even when
//! nobody looks at the collection.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    #[error("{}: entry dropped: {reason}", .tag.as_deref().unwrap_or("<unknown>"))]
    EntryDropped { tag: Option<String>, reason: String },
    #[error("more than one @preamble; earlier @preamble will be lost")]
    DuplicatePreamble,
    #[error("crossref {target} for entry {tag} not found")]
    UnresolvedCrossref { tag: String, target: String },
    #[error("{0} has no authors or editors")]
    MissingAuthor(String),
    #[error("{0} has no title")]
    MissingTitle(String),
    #[error("{0} has no year")]
    MissingYear(String),
}

/// Collector for [`Diagnostic`]s.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!("{diagnostic}");
        self.items.push(diagnostic);
    }

    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_entry_message_names_tag() {
        let d = Diagnostic::EntryDropped {
            tag: Some("Knuth84".into()),
            reason: "too many fields".into(),
        };
        assert_eq!(d.to_string(), "Knuth84: entry dropped: too many fields");
    }

    #[test]
    fn dropped_entry_without_tag() {
        let d = Diagnostic::EntryDropped {
            tag: None,
            reason: "unexpected end of input".into(),
        };
        assert!(d.to_string().starts_with("<unknown>:"));
    }

    #[test]
    fn push_collects_in_order() {
        let mut diags = Diagnostics::new();
        assert!(diags.is_empty());
        diags.push(Diagnostic::DuplicatePreamble);
        diags.push(Diagnostic::MissingYear("x".into()));
        assert_eq!(diags.len(), 2);
        assert_eq!(diags.items()[1], Diagnostic::MissingYear("x".into()));
    }
}
