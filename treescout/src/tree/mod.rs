//! The immutable tree produced by the builder.
//!
//! A tree is a [`Folder`] that owns its sub-folders and [`Document`]s. There
//! are no parent links and no shared ownership, so a finished tree can be
//! read from any number of threads without locking. [`Entry`] is the borrowed,
//! tagged view of either kind of node used by traversal.
pub mod content;
mod document;
mod folder;

pub use content::EncodingMode;
pub use document::Document;
pub use folder::Folder;
pub(crate) use folder::Built;

use std::path::Path;

/// Borrowed view of any node in a tree
#[derive(Debug, Clone, Copy)]
pub enum Entry<'a> {
    Folder(&'a Folder),
    Document(&'a Document),
}

impl<'a> Entry<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Entry::Folder(folder) => folder.name(),
            Entry::Document(document) => document.name(),
        }
    }

    pub fn path(&self) -> &'a Path {
        match self {
            Entry::Folder(folder) => folder.path(),
            Entry::Document(document) => document.path(),
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            Entry::Folder(folder) => folder.size(),
            Entry::Document(document) => document.size(),
        }
    }

    pub fn as_document(&self) -> Option<&'a Document> {
        match self {
            Entry::Document(document) => Some(document),
            Entry::Folder(_) => None,
        }
    }

    pub fn as_folder(&self) -> Option<&'a Folder> {
        match self {
            Entry::Folder(folder) => Some(folder),
            Entry::Document(_) => None,
        }
    }

    pub fn is_document(&self) -> bool {
        matches!(self, Entry::Document(_))
    }
}

/// Last path component, or the whole path for roots such as `/` or `.`
pub(crate) fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
