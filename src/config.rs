//! Run configuration.
//!
//! Handles loading, validating, and merging `bibtag.toml`. Stock defaults are
//! serialized to a TOML table and the user file is merged on top of it, so a
//! config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [tag]
//! hyphens = true            # keep hyphens from names and titles in tags
//! name_prefixes = ["De", "Di", "La", "El", "Von", "Van"]
//! stop_words = ["A", "An", "And", "Are", "But", "By", "For", "From", "In",
//!               "Is", "Of", "On", "Over", "The", "To", "Was", "Were", "With"]
//! year_digits = 2           # trailing year digits in the tag (0-4)
//! check_digits = 1          # letters added by the "check" stage
//!
//! [tag.author]
//! first_len = 12            # letters from the first author's surname
//! later_len = 2             # letters from each later author's surname
//! max_authors = 6           # authors that contribute at all, at least 1
//!
//! [tag.title]
//! first_len = 1             # letters from the first significant title word
//! later_len = 1             # letters from each later word
//! max_words = 5             # words that contribute at all
//!
//! [output]
//! attribute_indent = 0      # spaces before each attribute (0-20)
//! value_indent = 15         # column where values start (0-40)
//! compact_equals = false    # attr=value instead of attr = value
//! delimiters = "keep"       # keep | braces | quotes
//! save_old_tags = false     # record replaced tags in an `oldtag` field
//! sort = true               # sort entries by tag
//! sort_seed = 0             # pivot seed; fixed so runs are reproducible
//!
//! [limits]
//! max_entries = 10000       # content entries per run (fatal when exceeded)
//! max_fields = 100          # field slots per entry, history slot included
//! max_strings = 1000        # @string definitions per run (fatal when exceeded)
//!
//! [pipeline]
//! stages = []               # e.g. ["author", "title", "year", "unique"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::tags::Stage;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File looked up in the working directory when no config path is given.
pub const CONFIG_FILENAME: &str = "bibtag.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Complete configuration for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BibtagConfig {
    /// Bounds and word lists used by the tag stages.
    pub tag: TagConfig,
    /// Layout of the rewritten database.
    pub output: OutputConfig,
    /// Resource guards applied while parsing.
    pub limits: Limits,
    /// Stages to run, in order.
    pub pipeline: PipelineConfig,
}

impl BibtagConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tag.year_digits > 4 {
            return Err(ConfigError::Validation(
                "tag.year_digits must be 0-4".into(),
            ));
        }
        if self.output.attribute_indent > 20 {
            return Err(ConfigError::Validation(
                "output.attribute_indent must be 0-20".into(),
            ));
        }
        if self.output.value_indent > 40 {
            return Err(ConfigError::Validation(
                "output.value_indent must be 0-40".into(),
            ));
        }
        if self.limits.max_entries == 0 || self.limits.max_strings == 0 {
            return Err(ConfigError::Validation(
                "limits.max_entries and limits.max_strings must be non-zero".into(),
            ));
        }
        if self.tag.author.max_authors == 0 {
            return Err(ConfigError::Validation(
                "tag.author.max_authors must be at least 1".into(),
            ));
        }
        if self.limits.max_fields < 2 {
            return Err(ConfigError::Validation(
                "limits.max_fields must be at least 2".into(),
            ));
        }
        Ok(())
    }
}

/// Settings consumed by every tag stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TagConfig {
    /// Keep hyphens inside name and title words.
    pub hyphens: bool,
    /// Words joined onto the following surname word (`Von Neumann`).
    pub name_prefixes: Vec<String>,
    /// Title words that never contribute to a tag.
    pub stop_words: Vec<String>,
    /// Number of trailing year digits.
    pub year_digits: usize,
    /// Number of letters appended by the check stage.
    pub check_digits: usize,
    pub author: AuthorBounds,
    pub title: TitleBounds,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            hyphens: true,
            name_prefixes: ["De", "Di", "La", "El", "Von", "Van"]
                .map(String::from)
                .to_vec(),
            stop_words: [
                "A", "An", "And", "Are", "But", "By", "For", "From", "In", "Is", "Of", "On",
                "Over", "The", "To", "Was", "Were", "With",
            ]
            .map(String::from)
            .to_vec(),
            year_digits: 2,
            check_digits: 1,
            author: AuthorBounds::default(),
            title: TitleBounds::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorBounds {
    pub first_len: usize,
    pub later_len: usize,
    pub max_authors: usize,
}

impl Default for AuthorBounds {
    fn default() -> Self {
        Self {
            first_len: 12,
            later_len: 2,
            max_authors: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TitleBounds {
    pub first_len: usize,
    pub later_len: usize,
    pub max_words: usize,
}

impl Default for TitleBounds {
    fn default() -> Self {
        Self {
            first_len: 1,
            later_len: 1,
            max_words: 5,
        }
    }
}

/// Which delimiters values are written with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueStyle {
    /// Leave values as read.
    #[default]
    Keep,
    /// Rewrite `"..."` values as `{...}`.
    Braces,
    /// Rewrite `{...}` values as `"..."`.
    Quotes,
}

impl ValueStyle {
    /// Delimiters used for values this tool writes itself.
    pub fn delimiters(self) -> (char, char) {
        match self {
            ValueStyle::Keep | ValueStyle::Braces => ('{', '}'),
            ValueStyle::Quotes => ('"', '"'),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub attribute_indent: usize,
    pub value_indent: usize,
    pub compact_equals: bool,
    pub delimiters: ValueStyle,
    /// Write an `oldtag` field on entries whose tag changed.
    pub save_old_tags: bool,
    pub sort: bool,
    /// Seed for the sort's pivot choice.
    pub sort_seed: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            attribute_indent: 0,
            value_indent: 15,
            compact_equals: false,
            delimiters: ValueStyle::Keep,
            save_old_tags: false,
            sort: true,
            sort_seed: 0,
        }
    }
}

/// Input-size guards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Limits {
    pub max_entries: usize,
    /// Field slots per entry, counting the reserved history slot.
    pub max_fields: usize,
    pub max_strings: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_entries: 10000,
            max_fields: 100,
            max_strings: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Stages in run order. Empty means the default Author, Year,
    /// Extension, Unique computation.
    pub stages: Vec<Stage>,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Built-in defaults as a TOML table, the bottom layer under `bibtag.toml`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(BibtagConfig::default()).expect("default config must serialize")
}

/// Lay `overlay` over `base`.
///
/// A section such as `[tag.author]` only overrides the keys it names; every
/// other setting keeps its default. Arrays like `pipeline.stages` or
/// `tag.stop_words` are replaced whole, never appended to.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Build the final config from the defaults and an optional user file.
///
/// Unknown keys and out-of-range values are rejected here, before any input
/// is read.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<BibtagConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BibtagConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults if it is absent.
pub fn load_config(path: &Path) -> Result<BibtagConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(path)?)
}

/// Load config from `path`, which must exist.
pub fn load_config_file(path: &Path) -> Result<BibtagConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(stock_defaults_value(), Some(value))
}

/// Returns a fully-commented stock `bibtag.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# bibtag configuration
# ====================
#
# All settings are optional. Remove or comment out any you don't need;
# stock defaults apply for anything not specified.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Tag generation
# ---------------------------------------------------------------------------
[tag]
# Keep hyphens from names and titles ("Jean-Paul") in generated tags.
hyphens = true

# Words joined onto the following surname word: "von Neumann" -> "VonNeumann".
name_prefixes = ["De", "Di", "La", "El", "Von", "Van"]

# Title words that never contribute to a tag (compared case-insensitively).
stop_words = [
    "A", "An", "And", "Are", "But", "By", "For", "From", "In",
    "Is", "Of", "On", "Over", "The", "To", "Was", "Were", "With",
]

# Number of trailing year digits (0-4). A missing year gives "?" placeholders.
year_digits = 2

# Letters appended by the "check" stage, alternating consonant and vowel.
check_digits = 1

[tag.author]
# Letters taken from the first author's surname.
first_len = 12
# Letters taken from each later author's surname.
later_len = 2
# Authors that contribute at all (at least 1); the rest are ignored.
max_authors = 6

[tag.title]
# Letters taken from the first significant title word.
first_len = 1
# Letters taken from each later word.
later_len = 1
# Words that contribute at all.
max_words = 5

# ---------------------------------------------------------------------------
# Output layout
# ---------------------------------------------------------------------------
[output]
# Spaces before each attribute name (0-20).
attribute_indent = 0
# Column where values start (0-40).
value_indent = 15
# Write attr=value instead of attr = value.
compact_equals = false
# Value delimiters: "keep", "braces" or "quotes".
delimiters = "keep"
# Record a replaced tag in an "oldtag" field of the entry.
save_old_tags = false
# Sort entries by tag; cross-reference targets always go last.
sort = true
# Seed for the sort's pivot choice. Fixed so output is reproducible.
sort_seed = 0

# ---------------------------------------------------------------------------
# Input limits
# ---------------------------------------------------------------------------
[limits]
# Exceeding either of these aborts the run before any output is written.
max_entries = 10000
max_strings = 1000
# Field slots per entry, counting the slot reserved for "oldtag".
# An entry with more is dropped and parsing continues with the next one.
max_fields = 100

# ---------------------------------------------------------------------------
# Pipeline
# ---------------------------------------------------------------------------
[pipeline]
# Stages run in order, each appending to the tag built so far:
#   author  title  year  check  extension  previous  unique  literal:TEXT
# With no stages, tags are computed as author, year, extension, unique.
stages = []
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = BibtagConfig::default();
        assert_eq!(config.tag.author.first_len, 12);
        assert_eq!(config.tag.author.later_len, 2);
        assert_eq!(config.tag.author.max_authors, 6);
        assert_eq!(config.tag.title.max_words, 5);
        assert_eq!(config.tag.year_digits, 2);
        assert_eq!(config.tag.stop_words.len(), 18);
        assert_eq!(config.output.value_indent, 15);
        assert!(config.output.sort);
        assert!(config.pipeline.stages.is_empty());
    }

    #[test]
    fn parse_partial_config() {
        let toml_str = r#"
[tag.author]
first_len = 6
"#;
        let config: BibtagConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.tag.author.first_len, 6);
        // Unspecified values use defaults
        assert_eq!(config.tag.author.later_len, 2);
        assert_eq!(config.output.value_indent, 15);
    }

    #[test]
    fn parse_pipeline_stages() {
        let toml_str = r#"
[pipeline]
stages = ["author", "year", "literal:-", "unique"]
"#;
        let config: BibtagConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.pipeline.stages,
            vec![
                Stage::Author,
                Stage::Year,
                Stage::Literal("-".into()),
                Stage::Unique
            ]
        );
    }

    #[test]
    fn unknown_stage_rejected() {
        let toml_str = r#"
[pipeline]
stages = ["authors"]
"#;
        let result: Result<BibtagConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }

    #[test]
    fn parse_value_style() {
        let config: BibtagConfig = toml::from_str("[output]\ndelimiters = \"quotes\"\n").unwrap();
        assert_eq!(config.output.delimiters, ValueStyle::Quotes);
        assert_eq!(ValueStyle::Quotes.delimiters(), ('"', '"'));
        assert_eq!(ValueStyle::Keep.delimiters(), ('{', '}'));
    }

    #[test]
    fn stock_defaults_round_trip() {
        let config = resolve_config(stock_defaults_value(), None).unwrap();
        assert_eq!(config, BibtagConfig::default());
    }

    #[test]
    fn stock_config_toml_matches_defaults() {
        let config: BibtagConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, BibtagConfig::default());
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(config, BibtagConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            r#"
[output]
sort = false
value_indent = 20
"#,
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert!(!config.output.sort);
        assert_eq!(config.output.value_indent, 20);
        assert_eq!(config.output.attribute_indent, 0);
    }

    #[test]
    fn load_config_file_requires_file() {
        let tmp = TempDir::new().unwrap();
        let result = load_config_file(&tmp.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(&path, "this is not valid toml [[[").unwrap();
        assert!(load_config(&path).is_err());
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1").unwrap();
        let overlay: toml::Value = toml::from_str("a = 2").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("a").unwrap().as_integer(), Some(2));
    }

    #[test]
    fn merge_toml_deep_nested() {
        let base: toml::Value = toml::from_str(
            r#"
[tag.author]
first_len = 12
later_len = 2
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[tag.author]
first_len = 6
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let author = merged.get("tag").unwrap().get("author").unwrap();
        assert_eq!(author.get("first_len").unwrap().as_integer(), Some(6));
        assert_eq!(author.get("later_len").unwrap().as_integer(), Some(2));
    }

    #[test]
    fn merge_toml_replaces_arrays() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str("[tag]\nstop_words = [\"the\"]\n").unwrap();
        let config = resolve_config(base, Some(overlay)).unwrap();
        assert_eq!(config.tag.stop_words, vec!["the".to_string()]);
    }

    // =========================================================================
    // Unknown key rejection and validation
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let toml_str = r#"
[tag]
year_digit = 2
"#;
        let result: Result<BibtagConfig, _> = toml::from_str(toml_str);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<BibtagConfig, _> = toml::from_str("[outputs]\nsort = true\n");
        assert!(result.is_err());
    }

    #[test]
    fn validate_year_digits() {
        let mut config = BibtagConfig::default();
        config.tag.year_digits = 4;
        assert!(config.validate().is_ok());
        config.tag.year_digits = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_indents() {
        let mut config = BibtagConfig::default();
        config.output.attribute_indent = 21;
        assert!(config.validate().is_err());
        config.output.attribute_indent = 20;
        config.output.value_indent = 41;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_limits() {
        let mut config = BibtagConfig::default();
        config.limits.max_fields = 1;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_fields"));
        config.limits.max_fields = 2;
        config.limits.max_entries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_authors() {
        let mut config = BibtagConfig::default();
        config.tag.author.max_authors = 1;
        assert!(config.validate().is_ok());
        config.tag.author.max_authors = 0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_authors"));
    }

    #[test]
    fn zero_authors_in_file_is_rejected() {
        let overlay: toml::Value = toml::from_str("[tag.author]\nmax_authors = 0\n").unwrap();
        let err = resolve_config(stock_defaults_value(), Some(overlay)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
