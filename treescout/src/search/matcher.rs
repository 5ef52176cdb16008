use super::tokenizer::{Tokenizer, WordBoundary};

/// Counts literal occurrences of a word or phrase in text.
///
/// The target is split with the same [`Tokenizer`] as the text it is matched
/// against, so a multi-word target is a phrase matched against consecutive
/// words. Comparison is plain string equality: characters such as `.` or `*`
/// in the target only ever match themselves.
#[derive(Debug, Clone)]
pub struct PhraseMatcher {
    tokenizer: Tokenizer,
    phrase: Vec<String>,
}

impl PhraseMatcher {
    pub fn new(target: &str, boundary: WordBoundary, case_sensitive: bool) -> Self {
        let tokenizer = Tokenizer::new(boundary, case_sensitive);
        let phrase = tokenizer
            .tokens(target)
            .into_iter()
            .map(|word| word.into_owned())
            .collect();
        Self { tokenizer, phrase }
    }

    /// True when the target contains no words and can never match
    pub fn is_empty(&self) -> bool {
        self.phrase.is_empty()
    }

    pub fn phrase(&self) -> &[String] {
        &self.phrase
    }

    /// Number of occurrences in `text`; overlapping phrase occurrences each count
    pub fn count(&self, text: &str) -> usize {
        if self.phrase.is_empty() {
            return 0;
        }

        let words = self.tokenizer.tokens(text);
        if let [word] = self.phrase.as_slice() {
            return words.iter().filter(|w| **w == *word).count();
        }

        words
            .windows(self.phrase.len())
            .filter(|window| {
                window
                    .iter()
                    .zip(&self.phrase)
                    .all(|(w, p)| *w == *p)
            })
            .count()
    }
}
