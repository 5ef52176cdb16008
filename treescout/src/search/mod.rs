//! Word and phrase search over a finished tree.
pub mod engine;
pub mod matcher;
pub mod tokenizer;

pub use engine::{line_count, Searcher};
pub use matcher::PhraseMatcher;
pub use tokenizer::{Tokenizer, WordBoundary};

use crate::config::SearchOptions;
use crate::errors::TreeResult;
use crate::results::SearchReport;
use crate::tree::Folder;

/// Counts occurrences of a word or phrase across every document in `folder`
pub fn search(folder: &Folder, target: &str, options: &SearchOptions) -> TreeResult<usize> {
    Searcher::new(options.clone()).search(folder, target)
}

/// Like [`search`], broken down per document
pub fn search_detailed(
    folder: &Folder,
    target: &str,
    options: &SearchOptions,
) -> TreeResult<SearchReport> {
    Searcher::new(options.clone()).search_detailed(folder, target)
}

/// Counts lines across every document in `folder`
pub fn count_lines(folder: &Folder, options: &SearchOptions) -> TreeResult<u64> {
    Searcher::new(options.clone()).count_lines(folder)
}
