use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use unicode_categories::UnicodeCategories;

static WORD_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

/// How text is split into words
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordBoundary {
    /// Whitespace-delimited, with leading and trailing punctuation and symbols
    /// removed, so `cat,`, `(cat)`, `<cat>` and `$cat` all read as `cat` while
    /// `c.t` stays `c.t`
    #[default]
    Trimmed,
    /// Whitespace-delimited, punctuation kept as part of the word
    Whitespace,
    /// Maximal runs of Unicode word characters (letters, marks, digits,
    /// connectors). Every other character separates words, apostrophes
    /// included, so `can't` reads as `can` and `t`. This is a character-class
    /// split, not UAX #29 word segmentation.
    Unicode,
}

/// Splits text into comparable words
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    boundary: WordBoundary,
    case_sensitive: bool,
}

impl Tokenizer {
    pub fn new(boundary: WordBoundary, case_sensitive: bool) -> Self {
        Self {
            boundary,
            case_sensitive,
        }
    }

    /// Words of `text` in order, lower-cased when matching is case-insensitive
    pub fn tokens<'t>(&self, text: &'t str) -> Vec<Cow<'t, str>> {
        let raw: Box<dyn Iterator<Item = &'t str> + 't> = match self.boundary {
            WordBoundary::Whitespace => Box::new(text.split_whitespace()),
            WordBoundary::Trimmed => Box::new(
                text.split_whitespace()
                    .map(|word| word.trim_matches(is_word_edge))
                    .filter(|word| !word.is_empty()),
            ),
            WordBoundary::Unicode => Box::new(WORD_RUN.find_iter(text).map(|m| m.as_str())),
        };

        if self.case_sensitive {
            raw.map(Cow::Borrowed).collect()
        } else {
            raw.map(|word| Cow::Owned(word.to_lowercase())).collect()
        }
    }
}

/// Characters stripped from either end of a word in [`WordBoundary::Trimmed`]
fn is_word_edge(c: char) -> bool {
    c.is_punctuation() || c.is_symbol() || c.is_ascii_punctuation()
}
