//! Name and title tokenization for tag generation.
//!
//! Author lists and titles are raw field values such as
//! `"Rivest, Ronald L. and Di Crescenzo, Giovanni"` or
//! `{The {\TeX}book}`. [`NameTokens`] splits them into words the way a
//! citation key wants them:
//!
//! - letters, digits, apostrophes (and hyphens, when enabled) build a word
//! - braces are tracked but never copied; inside braces punctuation and
//!   spaces are dropped instead of ending the word
//! - a backslash drops itself and the character it escapes, so `{\"o}`
//!   contributes just `o`
//! - punctuation or whitespace outside braces ends the word; the separators
//!   after it are skipped and a comma among them is remembered
//! - the first character of every word is upper-cased
//!
//! [`surnames`] and [`title_words`] build on the tokens to pick out what the
//! author and title stages contribute.

/// One word of a name list or title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameToken {
    pub text: String,
    /// A comma was among the separators after this word.
    pub comma_after: bool,
}

/// Iterator over the words of a raw field value.
///
/// Iteration stops at the first empty word.
pub struct NameTokens<'a> {
    rest: &'a str,
    hyphens: bool,
}

impl<'a> NameTokens<'a> {
    /// Tokenize a raw value, skipping its opening quote or brace.
    pub fn new(raw: &'a str, hyphens: bool) -> Self {
        let rest = raw
            .strip_prefix('"')
            .or_else(|| raw.strip_prefix('{'))
            .unwrap_or(raw);
        Self { rest, hyphens }
    }

    fn keeps(&self, c: char) -> bool {
        c.is_alphanumeric() || c == '\'' || (self.hyphens && c == '-')
    }
}

fn is_separator(c: char) -> bool {
    c.is_ascii_punctuation() || c.is_whitespace()
}

impl Iterator for NameTokens<'_> {
    type Item = NameToken;

    fn next(&mut self) -> Option<NameToken> {
        let mut text = String::new();
        let mut depth = 0i32;
        let mut chars = self.rest.char_indices().peekable();
        let mut end = self.rest.len();
        while let Some(&(i, c)) = chars.peek() {
            if self.keeps(c) {
                text.push(c);
                chars.next();
            } else if c == '{' {
                depth += 1;
                chars.next();
            } else if c == '}' {
                depth -= 1;
                chars.next();
            } else if c == '\\' {
                chars.next();
                chars.next();
            } else if is_separator(c) && depth == 0 {
                end = i;
                break;
            } else {
                chars.next();
            }
        }

        let tail = &self.rest[end..];
        let skipped = tail
            .find(|c: char| matches!(c, '{' | '\\' | '}') || !is_separator(c))
            .unwrap_or(tail.len());
        let comma_after = tail[..skipped].contains(',');
        self.rest = &tail[skipped..];

        if text.is_empty() {
            self.rest = "";
            return None;
        }
        Some(NameToken {
            text: capitalize(&text),
            comma_after,
        })
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Surnames of the authors in a raw author (or editor) value.
///
/// `and` separates authors. Within one author the last word wins, except
/// that a name prefix (e.g. `Von`) is joined to the word after it, `jr` is
/// ignored, and nothing after a comma counts (`Last, First`).
pub fn surnames(raw: &str, hyphens: bool, prefixes: &[String]) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = String::new();
    let mut after_prefix = false;
    let mut comma_seen = false;
    for token in NameTokens::new(raw, hyphens) {
        if token.text.eq_ignore_ascii_case("and") {
            names.push(std::mem::take(&mut current));
            after_prefix = false;
            comma_seen = false;
            continue;
        }
        if !comma_seen {
            if after_prefix {
                current.push_str(&token.text);
            } else if !token.text.eq_ignore_ascii_case("jr") {
                current = token.text.clone();
            }
        }
        if token.comma_after {
            comma_seen = true;
        }
        after_prefix = prefixes.iter().any(|p| p.eq_ignore_ascii_case(&token.text));
    }
    names.push(current);
    names
}

/// Words of a raw title with stop words removed.
pub fn title_words(raw: &str, hyphens: bool, stop_words: &[String]) -> Vec<String> {
    NameTokens::new(raw, hyphens)
        .map(|t| t.text)
        .filter(|w| !stop_words.iter().any(|s| s.eq_ignore_ascii_case(w)))
        .collect()
}

/// Up to `limit` letters of `word` (hyphens count as letters when enabled).
pub fn leading_letters(word: &str, limit: usize, hyphens: bool) -> String {
    word.chars()
        .filter(|&c| c.is_alphabetic() || (hyphens && c == '-'))
        .take(limit)
        .collect()
}
