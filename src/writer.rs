//! Database serializer.
//!
//! Output order is: file leading text, the preamble, string definitions,
//! content entries, trailing text. Every record is preceded by its own
//! leading text exactly as read. Content entries are laid out as
//!
//! ```text
//! @article{Rivest92,
//! author =       "Rivest, Ronald L.",
//! year =         1992
//! }
//! ```
//!
//! Attribute names are lower-cased and padded so values start at the
//! configured column. Runs of whitespace inside a value collapse to one
//! space, and a long value is wrapped at the first space past column 65,
//! continuing at the value column.

use crate::config::{OutputConfig, ValueStyle};
use crate::database::Database;
use crate::types::{Entry, EntryKind, Field};
use std::borrow::Cow;
use std::io::{self, Write};

/// Values wrap at the first space once output passes this column.
pub const WRAP_COLUMN: usize = 65;

pub struct Writer<'a> {
    config: &'a OutputConfig,
}

impl<'a> Writer<'a> {
    pub fn new(config: &'a OutputConfig) -> Self {
        Self { config }
    }

    /// Write the whole database to `out`.
    pub fn write_database<W: Write>(&self, db: &Database, out: &mut W) -> io::Result<()> {
        out.write_all(self.render(db).as_bytes())?;
        out.flush()
    }

    /// Render the whole database. The result always ends with a newline.
    pub fn render(&self, db: &Database) -> String {
        let mut out = db.leading_text.clone();
        let records = db
            .preamble
            .iter()
            .chain(db.strings.iter())
            .chain(db.entries.iter());
        for entry in records {
            self.render_entry(entry, &mut out);
        }
        out.push_str(&db.trailing_text);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }

    /// Append one record, its leading text included.
    pub fn render_entry(&self, entry: &Entry, out: &mut String) {
        out.push_str(&entry.leading_text);
        out.push_str(&entry.entry_type);
        match entry.kind() {
            EntryKind::String => {
                out.push_str(entry.string_definition.as_deref().unwrap_or_default());
            }
            EntryKind::Preamble => {
                out.push('{');
                out.push_str(&entry.tag);
                out.push('}');
            }
            EntryKind::Content => {
                out.push('{');
                out.push_str(&entry.tag);
                out.push(',');
                let fields: Vec<&Field> = entry.history.iter().chain(entry.fields.iter()).collect();
                for (i, field) in fields.iter().enumerate() {
                    self.render_field(field, out);
                    if i + 1 < fields.len() {
                        out.push(',');
                    }
                }
                out.push_str("\n}");
            }
        }
    }

    fn render_field(&self, field: &Field, out: &mut String) {
        let attribute_indent = self.config.attribute_indent;
        let value_indent = self.config.value_indent;

        out.push('\n');
        push_spaces(out, attribute_indent);
        out.push_str(&field.name.to_lowercase());
        out.push_str(if self.config.compact_equals { "=" } else { " = " });
        let used = field.name.chars().count() + attribute_indent + 3;
        push_spaces(out, value_indent.saturating_sub(used));

        let value = restyle(&field.value, self.config.delimiters);
        let mut column = value_indent;
        let mut last = ' ';
        for c in value.chars() {
            let c = if c.is_whitespace() { ' ' } else { c };
            if column > WRAP_COLUMN && c == ' ' {
                out.push('\n');
                push_spaces(out, value_indent);
                column = value_indent;
                last = ' ';
            }
            if last != ' ' || c != ' ' {
                out.push(c);
                column += 1;
            }
            last = c;
        }
    }
}

fn push_spaces(out: &mut String, count: usize) {
    out.extend(std::iter::repeat_n(' ', count));
}

/// Swap a value's outer delimiters to the requested style.
///
/// Only a value wrapped in the opposite pair is touched; bare values and
/// values already in the requested style pass through.
pub fn restyle(value: &str, style: ValueStyle) -> Cow<'_, str> {
    let (from, to) = match style {
        ValueStyle::Keep => return Cow::Borrowed(value),
        ValueStyle::Braces => (('"', '"'), ('{', '}')),
        ValueStyle::Quotes => (('{', '}'), ('"', '"')),
    };
    let inner = value
        .strip_prefix(from.0)
        .and_then(|rest| rest.strip_suffix(from.1));
    match inner {
        Some(inner) => Cow::Owned(format!("{}{inner}{}", to.0, to.1)),
        None => Cow::Borrowed(value),
    }
}

/// Render a database with `config` into a string.
pub fn to_string(db: &Database, config: &OutputConfig) -> String {
    Writer::new(config).render(db)
}
