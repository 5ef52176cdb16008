use once_cell::sync::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;

use super::content::{self, EncodingMode};
use super::entry_name;
use crate::errors::TreeResult;

/// Leaf entry of a tree: a file whose text is loaded at most once.
///
/// An eagerly built document already holds its text. A lazily built one
/// reads it on the first call to [`Document::content`]; concurrent readers
/// block on the same initialisation and then share the result.
pub struct Document {
    name: String,
    path: PathBuf,
    encoding_mode: EncodingMode,
    content: OnceCell<Arc<str>>,
}

impl Document {
    /// Creates a document whose text has already been read
    pub(crate) fn loaded(path: PathBuf, encoding_mode: EncodingMode, text: String) -> Self {
        Self {
            name: entry_name(&path),
            path,
            encoding_mode,
            content: OnceCell::with_value(Arc::from(text)),
        }
    }

    /// Creates a document that reads its text on first access
    pub(crate) fn deferred(path: PathBuf, encoding_mode: EncodingMode) -> Self {
        Self {
            name: entry_name(&path),
            path,
            encoding_mode,
            content: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A document always counts as a single entry
    pub fn size(&self) -> u64 {
        1
    }

    pub fn encoding_mode(&self) -> EncodingMode {
        self.encoding_mode
    }

    pub fn is_loaded(&self) -> bool {
        self.content.get().is_some()
    }

    /// Returns the document text, reading it from disk on first use
    pub fn content(&self) -> TreeResult<&str> {
        self.shared_content().map(|text| &**text)
    }

    /// Like [`Document::content`] but hands out a shared handle that can
    /// move into a worker task
    pub fn shared_content(&self) -> TreeResult<&Arc<str>> {
        self.content.get_or_try_init(|| {
            trace!("Loading deferred document: {}", self.path.display());
            let (text, _) = content::read_text(&self.path, self.encoding_mode)?;
            Ok(Arc::from(text))
        })
    }

    /// The text if it has been read, without triggering a read
    pub(crate) fn loaded_content(&self) -> Option<&Arc<str>> {
        self.content.get()
    }

    /// Stores text that was read elsewhere; a no-op if already loaded
    pub(crate) fn prime(&self, text: Arc<str>) {
        let _ = self.content.set(text);
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
