//! Tag generation.
//!
//! A tag is built by folding an ordered list of [`Stage`]s over every content
//! entry. Each stage sees the tag accumulated so far (`computed_tag`) and
//! returns the next one; stages never look at each other's output except
//! through that string.
//!
//! Stages run stage-major: the first stage runs over all entries, then the
//! second, and so on. This makes the uniqueness stage see every root tag in
//! file order, which is what decides who gets the `a` suffix.
//!
//! Entries that end up with no computed tag get the default treatment
//! (author, year, extension, unique) afterwards. A `newtag` field always wins
//! over whatever the stages produced.

use crate::config::TagConfig;
use crate::database::Database;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::naming::{leading_letters, surnames, title_words};
use crate::registry::UniquenessRegistry;
use crate::types::{Entry, Field, NEW_TAG, OLD_TAG, Rename, Record};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const CONSONANTS: &[u8] = b"bcdfghjklmnpqrstvwxyz";
const VOWELS: &[u8] = b"aeiou";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageParseError {
    #[error(
        "unknown stage '{0}' (expected author, title, year, check, extension, previous, unique or literal:TEXT)"
    )]
    Unknown(String),
}

/// One step of the tag pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Stage {
    /// Letters from the authors' (or editors') surnames.
    Author,
    /// Initial letters of significant title words.
    Title,
    /// Trailing digits of the year.
    Year,
    /// Pronounceable checksum over the entry's field values.
    Check,
    /// Restore the old tag when the new one is a prefix of it.
    Extension,
    /// Fixed text.
    Literal(String),
    /// The old tag verbatim.
    Previous,
    /// Disambiguating suffix against tags already handed out.
    Unique,
}

impl FromStr for Stage {
    type Err = StageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(text) = s.strip_prefix("literal:") {
            return Ok(Stage::Literal(text.to_string()));
        }
        match s {
            "author" => Ok(Stage::Author),
            "title" => Ok(Stage::Title),
            "year" => Ok(Stage::Year),
            "check" => Ok(Stage::Check),
            "extension" => Ok(Stage::Extension),
            "previous" => Ok(Stage::Previous),
            "unique" => Ok(Stage::Unique),
            other => Err(StageParseError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Author => f.write_str("author"),
            Stage::Title => f.write_str("title"),
            Stage::Year => f.write_str("year"),
            Stage::Check => f.write_str("check"),
            Stage::Extension => f.write_str("extension"),
            Stage::Literal(text) => write!(f, "literal:{text}"),
            Stage::Previous => f.write_str("previous"),
            Stage::Unique => f.write_str("unique"),
        }
    }
}

impl TryFrom<String> for Stage {
    type Error = StageParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Stage> for String {
    fn from(stage: Stage) -> Self {
        stage.to_string()
    }
}

/// The stages run for entries no configured stage produced a tag for.
pub const DEFAULT_STAGES: [Stage; 4] = [Stage::Author, Stage::Year, Stage::Extension, Stage::Unique];

impl Stage {
    /// Compute the next tag for `record`.
    ///
    /// `None` leaves the accumulated tag untouched; this happens only when
    /// the author or title stage finds no source field.
    pub fn apply(
        &self,
        record: Record<'_>,
        config: &TagConfig,
        registry: &mut UniquenessRegistry,
        diagnostics: &mut Diagnostics,
    ) -> Option<String> {
        let entry = record.entry;
        let mut tag = record.current_tag().to_string();
        match self {
            Stage::Author => {
                let Some(raw) = record.value("author").or_else(|| record.value("editor")) else {
                    if !entry.is_crossref_target {
                        diagnostics.push(Diagnostic::MissingAuthor(entry.tag.clone()));
                    }
                    return None;
                };
                let bounds = &config.author;
                let names = surnames(raw, config.hyphens, &config.name_prefixes);
                for (i, name) in names.iter().take(bounds.max_authors).enumerate() {
                    let limit = if i == 0 { bounds.first_len } else { bounds.later_len };
                    tag.push_str(&leading_letters(name, limit, config.hyphens));
                }
            }
            Stage::Title => {
                let Some(raw) = record.value("title") else {
                    diagnostics.push(Diagnostic::MissingTitle(entry.tag.clone()));
                    return None;
                };
                let bounds = &config.title;
                let words = title_words(raw, config.hyphens, &config.stop_words);
                for (i, word) in words.iter().take(bounds.max_words).enumerate() {
                    let limit = if i == 0 { bounds.first_len } else { bounds.later_len };
                    tag.push_str(&leading_letters(word, limit, config.hyphens));
                }
            }
            Stage::Year => match record.value("year") {
                Some(raw) => tag.push_str(&year_suffix(raw, config.year_digits)),
                None => {
                    diagnostics.push(Diagnostic::MissingYear(entry.tag.clone()));
                    tag.extend(std::iter::repeat_n('?', config.year_digits));
                }
            },
            Stage::Check => tag.push_str(&check_letters(&entry.fields, config.check_digits)),
            Stage::Extension => {
                if entry.tag.starts_with(&tag) {
                    tag = entry.tag.clone();
                }
            }
            Stage::Literal(text) => tag.push_str(text),
            Stage::Previous => tag.push_str(&entry.tag),
            Stage::Unique => tag = registry.claim(&tag),
        }
        Some(tag)
    }
}

/// The last `digits` digits (or `?` placeholders) of a raw year value.
fn year_suffix(raw: &str, digits: usize) -> String {
    let kept: Vec<char> = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '?')
        .collect();
    kept[kept.len().saturating_sub(digits)..].iter().collect()
}

/// Checksum letters over every value except `oldtag` and `newtag`.
fn check_letters(fields: &[Field], count: usize) -> String {
    let mut check: u32 = fields
        .iter()
        .filter(|f| !f.is_named(OLD_TAG) && !f.is_named(NEW_TAG))
        .flat_map(|f| f.value.bytes())
        .filter(u8::is_ascii_alphanumeric)
        .fold(0, |check, b| (check * 23 + u32::from(b)) % 12345);
    (0..count)
        .map(|pos| {
            let alphabet = if pos % 2 == 0 { CONSONANTS } else { VOWELS };
            let base = alphabet.len() as u32;
            let letter = alphabet[(check % base) as usize];
            check /= base;
            char::from(letter)
        })
        .collect()
}

/// Runs stages over a database, owning the uniqueness registry.
pub struct TagGenerator<'a> {
    config: &'a TagConfig,
    registry: UniquenessRegistry,
}

impl<'a> TagGenerator<'a> {
    pub fn new(config: &'a TagConfig) -> Self {
        Self {
            config,
            registry: UniquenessRegistry::new(),
        }
    }

    /// Run `stages` over every content entry, then fill in defaults.
    pub fn run(&mut self, stages: &[Stage], db: &mut Database, diagnostics: &mut Diagnostics) {
        for stage in stages {
            self.run_stage(stage, db, diagnostics);
        }
        self.apply_defaults(db, diagnostics);
    }

    /// Run one stage over all content entries in order.
    pub fn run_stage(&mut self, stage: &Stage, db: &mut Database, diagnostics: &mut Diagnostics) {
        if *stage == Stage::Unique {
            self.registry.reset();
        }
        for i in 0..db.entries.len() {
            self.step(stage, db, i, diagnostics);
        }
    }

    /// Give every entry without a computed tag the default one.
    ///
    /// The registry is not reset here, so default tags stay distinct from
    /// tags handed out by an earlier uniqueness stage.
    pub fn apply_defaults(&mut self, db: &mut Database, diagnostics: &mut Diagnostics) {
        for i in 0..db.entries.len() {
            if db.entries[i].computed_tag.is_some() {
                continue;
            }
            for stage in &DEFAULT_STAGES {
                self.step(stage, db, i, diagnostics);
            }
        }
    }

    fn step(&mut self, stage: &Stage, db: &mut Database, index: usize, diagnostics: &mut Diagnostics) {
        let next = stage.apply(db.record(index), self.config, &mut self.registry, diagnostics);
        if let Some(tag) = next {
            db.entries[index].computed_tag = Some(tag);
        }
    }
}

/// The tag forced by a `newtag` field, with one layer of delimiters removed.
pub fn forced_tag(entry: &Entry) -> Option<String> {
    let raw = entry.local_value(NEW_TAG)?;
    let Some(inner) = raw.strip_prefix(['"', '{']) else {
        return Some(raw.to_string());
    };
    let mut inner = inner.to_string();
    inner.pop();
    Some(inner)
}

/// Replace the tags of all entries that are not cross-reference targets.
///
/// With `history` set to a delimiter pair, an entry whose tag changes gets
/// its old tag recorded in the reserved `oldtag` slot.
pub fn replace_tags(entries: &mut [Entry], history: Option<(char, char)>) -> Vec<Rename> {
    let mut renames = Vec::new();
    for entry in entries.iter_mut() {
        if let Some(forced) = forced_tag(entry) {
            entry.computed_tag = Some(forced);
        }
        if entry.is_crossref_target {
            continue;
        }
        let Some(new) = entry.computed_tag.clone() else {
            continue;
        };
        if new == entry.tag {
            continue;
        }
        tracing::info!("{} ==> {}", entry.tag, new);
        let old = std::mem::replace(&mut entry.tag, new.clone());
        if let Some((open, close)) = history {
            entry.history = Some(Field::new(OLD_TAG, format!("{open}{old}{close}")));
        }
        renames.push(Rename { old, new });
    }
    renames
}
