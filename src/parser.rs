//! Entry parser.
//!
//! Turns lexer tokens into [`Entry`] records through an explicit state
//! machine:
//!
//! ```text
//! SeekBoundary → ReadType → StringBody ──────────────→ entry
//!                         └→ Body ────────────────────→ entry
//!                   any failure → Resync → SeekBoundary
//! ```
//!
//! A failure inside an entry (unreadable token, too many fields) drops that
//! entry only: the rest of its text up to the next boundary marker is
//! discarded and parsing starts fresh. Comments that preceded the dropped
//! entry are carried over to the next one so they are not lost.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::lexer::{LexError, Lexer};
use crate::types::{CROSSREF_ONLY, Entry, EntryKind, Field};
use thiserror::Error;

/// Why an entry was abandoned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("more than {limit} fields")]
    TooManyFields { limit: usize },
}

enum State {
    SeekBoundary,
    ReadType,
    StringBody,
    Body,
    Resync(EntryError),
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    max_fields: usize,
    leading_text: String,
    trailing_text: String,
}

impl<'a> Parser<'a> {
    /// Create a parser and consume the file's leading free text.
    ///
    /// `max_fields` bounds the field slots of one entry, the reserved history
    /// slot included.
    pub fn new(input: &'a str, max_fields: usize) -> Self {
        let mut lexer = Lexer::new(input);
        lexer.skip_whitespace();
        let leading_text = lexer.read_until_boundary();
        Self {
            lexer,
            max_fields,
            leading_text,
            trailing_text: String::new(),
        }
    }

    /// Free text before the first record.
    pub fn take_leading_text(&mut self) -> String {
        std::mem::take(&mut self.leading_text)
    }

    /// Free text after the last record; complete once `next_entry` returned `None`.
    pub fn take_trailing_text(&mut self) -> String {
        std::mem::take(&mut self.trailing_text)
    }

    /// Read the next entry, or `None` once the input is exhausted.
    pub fn next_entry(&mut self, diagnostics: &mut Diagnostics) -> Option<Entry> {
        let mut carried = String::new();
        let mut entry = Entry::default();
        let mut state = State::SeekBoundary;
        loop {
            state = match state {
                State::SeekBoundary => {
                    let mut text = std::mem::take(&mut carried);
                    text.push_str(&self.lexer.read_until_boundary());
                    if self.lexer.at_eof() {
                        self.trailing_text = text;
                        return None;
                    }
                    entry = Entry {
                        leading_text: text,
                        ..Entry::default()
                    };
                    State::ReadType
                }
                State::ReadType => {
                    entry.entry_type = self.lexer.read_entry_type();
                    match EntryKind::of(&entry.entry_type) {
                        EntryKind::String => State::StringBody,
                        _ => State::Body,
                    }
                }
                State::StringBody => match self.lexer.read_token(None) {
                    Ok(definition) => {
                        entry.string_definition = Some(definition);
                        return Some(finish(entry));
                    }
                    Err(e) => State::Resync(e.into()),
                },
                State::Body => match self.read_body(&mut entry) {
                    Ok(()) => {
                        if entry.has_field(CROSSREF_ONLY) {
                            entry.is_crossref_target = true;
                        }
                        return Some(finish(entry));
                    }
                    Err(e) => State::Resync(e),
                },
                State::Resync(error) => {
                    let tag = (!entry.tag.is_empty()).then(|| entry.tag.clone());
                    diagnostics.push(Diagnostic::EntryDropped {
                        tag,
                        reason: error.to_string(),
                    });
                    carried = std::mem::take(&mut entry.leading_text);
                    // Whatever is left of the broken entry is discarded.
                    self.lexer.read_until_boundary();
                    State::SeekBoundary
                }
            };
        }
    }

    fn read_body(&mut self, entry: &mut Entry) -> Result<(), EntryError> {
        self.lexer.skip_char('{');
        entry.tag = self.lexer.read_token(Some(','))?;
        loop {
            self.lexer.skip_whitespace();
            let closed = self.lexer.current() == Some('}');
            if closed || self.lexer.at_boundary() || self.lexer.at_eof() {
                break;
            }
            let name = self.lexer.read_token(Some('='))?;
            let value = self.lexer.read_token(Some(','))?;
            entry.fields.push(Field::new(name, value));
            if entry.field_slots() > self.max_fields {
                return Err(EntryError::TooManyFields {
                    limit: self.max_fields,
                });
            }
        }
        self.lexer.skip_char('}');
        Ok(())
    }
}

/// Make sure the boundary marker will land in column 1 on output.
fn finish(mut entry: Entry) -> Entry {
    if entry.leading_text.is_empty() {
        entry.leading_text.push_str("\n\n");
    } else if !entry.leading_text.ends_with('\n') {
        entry.leading_text.push('\n');
    }
    entry
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(input: &str, max_fields: usize) -> (Vec<Entry>, Diagnostics, Parser<'_>) {
        let mut parser = Parser::new(input, max_fields);
        let mut diags = Diagnostics::new();
        let mut entries = Vec::new();
        while let Some(e) = parser.next_entry(&mut diags) {
            entries.push(e);
        }
        (entries, diags, parser)
    }

    #[test]
    fn parses_content_entry() {
        let input = "@Article{Rivest92,\n  author = \"Rivest, Ronald L.\",\n  year = 1992\n}\n";
        let (entries, diags, _) = parse_all(input, 100);
        assert!(diags.is_empty());
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.entry_type, "@Article");
        assert_eq!(e.tag, "Rivest92");
        assert_eq!(
            e.fields,
            vec![
                Field::new("author", "\"Rivest, Ronald L.\""),
                Field::new("year", "1992"),
            ]
        );
        assert!(e.history.is_none());
        assert!(!e.is_crossref_target);
    }

    #[test]
    fn leading_text_split_between_file_and_entries() {
        let input = "% header\n\n@misc{a}\n\n% about b\n@misc{b}\n";
        let mut parser = Parser::new(input, 100);
        let mut diags = Diagnostics::new();
        assert_eq!(parser.take_leading_text(), "% header\n\n");
        let a = parser.next_entry(&mut diags).unwrap();
        assert_eq!(a.leading_text, "\n\n");
        let b = parser.next_entry(&mut diags).unwrap();
        assert_eq!(b.leading_text, "\n\n% about b\n");
        assert!(parser.next_entry(&mut diags).is_none());
        assert_eq!(parser.take_trailing_text(), "\n");
    }

    #[test]
    fn string_definition_is_opaque() {
        let input = "@STRING{stoc = \"Proc. STOC\"}\n";
        let (entries, _, _) = parse_all(input, 100);
        assert_eq!(entries[0].kind(), EntryKind::String);
        assert_eq!(
            entries[0].string_definition.as_deref(),
            Some("{stoc = \"Proc. STOC\"}")
        );
        assert!(entries[0].fields.is_empty());
    }

    #[test]
    fn trailing_comma_and_missing_comma() {
        let input = "@book{k,\n title = {T},\n year = 1984,\n}\n@book{m,\n title = {U}\n}\n";
        let (entries, diags, _) = parse_all(input, 100);
        assert!(diags.is_empty());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].fields.len(), 2);
        assert_eq!(entries[1].fields, vec![Field::new("title", "{U}")]);
    }

    #[test]
    fn last_entry_without_trailing_newline_is_kept() {
        let (entries, _, _) = parse_all("@misc{only, note = {x}}", 100);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].fields[0].value, "{x}");
    }

    #[test]
    fn crossrefonly_marks_target() {
        let input = "@proceedings{stoc92,\n crossrefonly = {yes},\n year = 1992\n}\n";
        let (entries, _, _) = parse_all(input, 100);
        assert!(entries[0].is_crossref_target);
        assert!(entries[0].crossref.is_none());
    }

    #[test]
    fn unterminated_quote_drops_entry_and_resyncs() {
        let input = "% first\n@article{bad,\n title = \"never closed,\n year = 1990\n}\n\n@article{good,\n year = 1984\n}\n";
        let (entries, diags, _) = parse_all(input, 100);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tag, "good");
        assert_eq!(entries[0].fields, vec![Field::new("year", "1984")]);
        assert_eq!(diags.len(), 1);
        assert!(matches!(
            &diags.items()[0],
            Diagnostic::EntryDropped { tag: Some(t), .. } if t == "bad"
        ));
    }

    #[test]
    fn too_many_fields_drops_only_that_entry() {
        let input = "@misc{before, a = 1}\n\
                     @misc{big, a = 1, b = 2, c = 3, d = 4}\n\
                     @misc{after, a = 1, b = 2}\n";
        let (entries, diags, _) = parse_all(input, 3);
        let tags: Vec<&str> = entries.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, ["before", "after"]);
        assert_eq!(entries[1].fields.len(), 2);
        assert!(diags.items()[0].to_string().contains("more than 3 fields"));
    }

    #[test]
    fn dropped_entry_comments_move_to_next_entry() {
        let input = "@misc{a}\n% keep me\n@misc{b, x = \"open\n@misc{c}\n";
        let (entries, _, _) = parse_all(input, 100);
        let tags: Vec<&str> = entries.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, ["a", "c"]);
        assert_eq!(entries[1].leading_text, "\n% keep me\n");
    }

    #[test]
    fn entry_cut_short_by_next_boundary() {
        let input = "@misc{a,\n note = {x}\n\n@misc{b}\n";
        let (entries, diags, _) = parse_all(input, 100);
        assert!(diags.is_empty());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].fields, vec![Field::new("note", "{x}")]);
        assert_eq!(entries[1].tag, "b");
    }

    #[test]
    fn missing_value_before_next_record_drops_entry() {
        let input = "@misc{a,\n note =\n@misc{b, year = 1999}\n@misc{c}\n";
        let (entries, diags, _) = parse_all(input, 100);
        let tags: Vec<&str> = entries.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, ["b", "c"]);
        assert_eq!(entries[0].fields, vec![Field::new("year", "1999")]);
        assert_eq!(
            diags.items(),
            [Diagnostic::EntryDropped {
                tag: Some("a".into()),
                reason: LexError::UnexpectedBoundary.to_string(),
            }]
        );
    }

    #[test]
    fn unclosed_last_entry_is_kept() {
        let (entries, diags, mut parser) = parse_all("@misc{a, note = {x}", 100);
        assert!(diags.is_empty());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tag, "a");
        assert_eq!(entries[0].fields, vec![Field::new("note", "{x}")]);
        assert_eq!(parser.take_trailing_text(), "");
    }

    #[test]
    fn eof_inside_entry_is_recoverable() {
        let (entries, diags, mut parser) = parse_all("@misc{a,\n note = ", 100);
        assert!(entries.is_empty());
        assert_eq!(diags.len(), 1);
        assert_eq!(parser.take_trailing_text(), "");
    }

    #[test]
    fn at_sign_inside_line_is_not_a_boundary() {
        let input = "@misc{a,\n email = {x @ y}\n}\n";
        let (entries, _, _) = parse_all(input, 100);
        assert_eq!(entries[0].fields[0].value, "{x @ y}");
    }
}
