use std::path::{Path, PathBuf};

use super::document::Document;
use super::entry_name;
use crate::traversal::{self, BreadthFirst, Entries};

/// Composite entry owning its sub-folders and documents.
///
/// Folders are only assembled by the builder, after every child has been
/// built, so `size` is final from the moment a folder exists:
/// `size == 1 + Σ sub_folder.size + documents.len()`.
#[derive(Debug)]
pub struct Folder {
    name: String,
    path: PathBuf,
    size: u64,
    sub_folders: Vec<Folder>,
    documents: Vec<Document>,
}

/// A finished child of a folder, as produced by one unit of build work
#[derive(Debug)]
pub(crate) enum Built {
    Folder(Folder),
    Document(Document),
}

impl Folder {
    /// Assembles a folder from finished children and derives its size
    pub(crate) fn assemble(path: PathBuf, sub_folders: Vec<Folder>, documents: Vec<Document>) -> Self {
        let size = 1 + sub_folders.iter().map(Folder::size).sum::<u64>() + documents.len() as u64;
        Self {
            name: entry_name(&path),
            path,
            size,
            sub_folders,
            documents,
        }
    }

    /// Single combiner step: splits built children by kind, then assembles
    pub(crate) fn from_built(path: PathBuf, children: Vec<Built>) -> Self {
        let mut sub_folders = Vec::new();
        let mut documents = Vec::new();
        for child in children {
            match child {
                Built::Folder(folder) => sub_folders.push(folder),
                Built::Document(document) => documents.push(document),
            }
        }
        Self::assemble(path, sub_folders, documents)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total number of entries rooted here, this folder included
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn sub_folders(&self) -> &[Folder] {
        &self.sub_folders
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.sub_folders.is_empty() && self.documents.is_empty()
    }

    /// Depth-first iterator over every entry rooted here
    pub fn entries(&self) -> Entries<'_> {
        traversal::entries(self)
    }

    /// Breadth-first iterator over every entry rooted here
    pub fn breadth_first(&self) -> BreadthFirst<'_> {
        traversal::breadth_first(self)
    }
}
