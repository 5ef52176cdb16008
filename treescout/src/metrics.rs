use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::tree::content::ReadPath;

/// Counters collected while a tree is being built.
///
/// Cloning shares the underlying counters, so every worker of a build can
/// hold its own handle and record into the same totals.
#[derive(Debug, Clone)]
pub struct BuildMetrics {
    folders_listed: Arc<AtomicU64>,
    entries_seen: Arc<AtomicU64>,
    documents_created: Arc<AtomicU64>,
    bytes_read: Arc<AtomicU64>,

    // Read path used for eagerly loaded documents
    small_reads: Arc<AtomicU64>,
    buffered_reads: Arc<AtomicU64>,
    mmap_reads: Arc<AtomicU64>,
}

impl BuildMetrics {
    /// Creates a new BuildMetrics instance
    pub fn new() -> Self {
        Self {
            folders_listed: Arc::new(AtomicU64::new(0)),
            entries_seen: Arc::new(AtomicU64::new(0)),
            documents_created: Arc::new(AtomicU64::new(0)),
            bytes_read: Arc::new(AtomicU64::new(0)),
            small_reads: Arc::new(AtomicU64::new(0)),
            buffered_reads: Arc::new(AtomicU64::new(0)),
            mmap_reads: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records one directory listing and the number of children it produced
    pub fn record_listing(&self, children: usize) {
        self.folders_listed.fetch_add(1, Ordering::Relaxed);
        let seen = self
            .entries_seen
            .fetch_add(children as u64, Ordering::Relaxed)
            + children as u64;
        debug!("Listed {} children, {} entries seen so far", children, seen);
    }

    pub fn record_document(&self) {
        self.documents_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a document read and which read path served it
    pub fn record_read(&self, bytes: u64, path: ReadPath) {
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
        let counter = match path {
            ReadPath::Small => &self.small_reads,
            ReadPath::Buffered => &self.buffered_reads,
            ReadPath::Mapped => &self.mmap_reads,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets a point-in-time copy of the counters
    pub fn get_stats(&self) -> BuildStats {
        BuildStats {
            folders_listed: self.folders_listed.load(Ordering::Relaxed),
            entries_seen: self.entries_seen.load(Ordering::Relaxed),
            documents_created: self.documents_created.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            small_reads: self.small_reads.load(Ordering::Relaxed),
            buffered_reads: self.buffered_reads.load(Ordering::Relaxed),
            mmap_reads: self.mmap_reads.load(Ordering::Relaxed),
        }
    }

    /// Logs the collected counters
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Build stats:\n\
             Folders listed: {}\n\
             Entries seen: {}\n\
             Documents created: {}\n\
             Bytes read: {}\n\
             Reads (small/buffered/mmap): {}/{}/{}",
            stats.folders_listed,
            stats.entries_seen,
            stats.documents_created,
            stats.bytes_read,
            stats.small_reads,
            stats.buffered_reads,
            stats.mmap_reads
        );
    }
}

impl Default for BuildMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of [`BuildMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    pub folders_listed: u64,
    pub entries_seen: u64,
    pub documents_created: u64,
    pub bytes_read: u64,
    pub small_reads: u64,
    pub buffered_reads: u64,
    pub mmap_reads: u64,
}
