/// Search result types.
///
/// A search produces one [`DocumentHits`] per document that matched at least
/// once, collected into a [`SearchReport`]. Every total is a plain sum, so
/// the order in which documents are recorded never changes the result.
use serde::Serialize;
use std::path::PathBuf;

/// Matches found in a single document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentHits {
    /// The path to the document
    pub path: PathBuf,
    /// Number of occurrences of the target in the document
    pub occurrences: usize,
}

/// The complete result of searching a tree for one target
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchReport {
    /// The word or phrase that was searched for
    pub target: String,
    /// Documents with at least one match, sorted by path
    pub hits: Vec<DocumentHits>,
    /// Total number of occurrences across all documents
    pub total_matches: usize,
    /// Total number of documents searched
    pub documents_searched: usize,
    /// Total number of documents with at least one match
    pub documents_with_matches: usize,
}

impl SearchReport {
    /// Creates a new empty report for `target`
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }

    /// Records the outcome of searching one document
    pub fn record(&mut self, path: PathBuf, occurrences: usize) {
        self.documents_searched += 1;
        if occurrences > 0 {
            self.total_matches += occurrences;
            self.documents_with_matches += 1;
            self.hits.push(DocumentHits { path, occurrences });
        }
    }

    /// Sorts hits by path so reports compare equal whatever order documents finished in
    pub fn finish(mut self) -> Self {
        self.hits.sort_by(|a, b| a.path.cmp(&b.path));
        self
    }
}
