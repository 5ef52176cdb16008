//! Lazy, restartable traversal over a finished tree.
//!
//! [`entries`] walks depth-first in pre-order: a folder is yielded before its
//! contents, documents of a folder before its sub-folders. [`breadth_first`]
//! yields a folder's direct children before anything deeper. Both yield the
//! same multiset of entries, and the tree is never modified, so any number
//! of traversals may run at once. Aggregates built on them (counts, search
//! totals) do not depend on the order chosen.
use rayon::prelude::*;
use std::collections::VecDeque;

use crate::tree::{Document, Entry, Folder};

/// Depth-first pre-order iterator, see [`entries`]
#[derive(Debug, Clone)]
pub struct Entries<'a> {
    stack: Vec<Entry<'a>>,
    remaining: usize,
}

impl<'a> Iterator for Entries<'a> {
    type Item = Entry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.stack.pop()?;
        if let Entry::Folder(folder) = entry {
            // Pushed in reverse so documents come off the stack first
            self.stack
                .extend(folder.sub_folders().iter().rev().map(Entry::Folder));
            self.stack
                .extend(folder.documents().iter().rev().map(Entry::Document));
        }
        self.remaining -= 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Entries<'_> {}

/// Breadth-first iterator, see [`breadth_first`]
#[derive(Debug, Clone)]
pub struct BreadthFirst<'a> {
    queue: VecDeque<Entry<'a>>,
    remaining: usize,
}

impl<'a> Iterator for BreadthFirst<'a> {
    type Item = Entry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.queue.pop_front()?;
        if let Entry::Folder(folder) = entry {
            self.queue
                .extend(folder.documents().iter().map(Entry::Document));
            self.queue
                .extend(folder.sub_folders().iter().map(Entry::Folder));
        }
        self.remaining -= 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for BreadthFirst<'_> {}

/// Depth-first pre-order sequence of every entry rooted at `folder`
pub fn entries(folder: &Folder) -> Entries<'_> {
    Entries {
        stack: vec![Entry::Folder(folder)],
        remaining: folder.size() as usize,
    }
}

/// Breadth-first sequence of every entry rooted at `folder`
pub fn breadth_first(folder: &Folder) -> BreadthFirst<'_> {
    BreadthFirst {
        queue: VecDeque::from([Entry::Folder(folder)]),
        remaining: folder.size() as usize,
    }
}

/// Every document rooted at `folder`, in depth-first order
pub fn documents(folder: &Folder) -> impl Iterator<Item = &Document> + '_ {
    entries(folder).filter_map(|entry| entry.as_document())
}

/// Number of entries rooted at `folder`, counted by walking the tree
pub fn count(folder: &Folder) -> u64 {
    entries(folder).fold(0, |total, _| total + 1)
}

/// Like [`count`], but sub-folder lists are partitioned across the current
/// rayon pool
pub fn par_count(folder: &Folder) -> u64 {
    let nested: u64 = folder.sub_folders().par_iter().map(par_count).sum();
    1 + folder.documents().len() as u64 + nested
}
