use futures::stream::{self, StreamExt, TryStreamExt};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, trace, warn};

use super::matcher::PhraseMatcher;
use crate::cancel::CancellationToken;
use crate::config::SearchOptions;
use crate::errors::{TreeError, TreeResult};
use crate::executor::{AbortOnDrop, Executor, Strategy};
use crate::results::SearchReport;
use crate::traversal;
use crate::tree::content::{self, EncodingMode};
use crate::tree::{Document, Folder};

static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n|\n|\r").unwrap());

/// Per-document measurement, e.g. phrase occurrences or line count
type ScanFn = Arc<dyn Fn(&str) -> usize + Send + Sync>;

/// Owned snapshot of a document that can move into a worker task
struct DocumentJob {
    path: PathBuf,
    encoding_mode: EncodingMode,
    loaded: Option<Arc<str>>,
}

impl DocumentJob {
    fn of(document: &Document) -> Self {
        Self {
            path: document.path().to_path_buf(),
            encoding_mode: document.encoding_mode(),
            loaded: document.loaded_content().cloned(),
        }
    }

    fn needs_read(&self) -> bool {
        self.loaded.is_none()
    }

    /// Reads the text if necessary and scans it; the text is handed back so
    /// the caller can cache it in the tree
    fn run(self, scan: &ScanFn, cancel: &CancellationToken) -> TreeResult<(Arc<str>, usize)> {
        cancel.check()?;
        let text = match self.loaded {
            Some(text) => text,
            None => Arc::from(content::read_text(&self.path, self.encoding_mode)?.0),
        };
        let found = scan(&text);
        trace!("Scanned {}: {}", self.path.display(), found);
        Ok((text, found))
    }
}

/// Runs read-only scans over the documents of a finished tree.
///
/// Every strategy visits every document exactly once and results are summed,
/// so totals never depend on the strategy or on completion order. Documents
/// that were built lazily are read on the I/O pool and their text is cached
/// in the tree for later searches.
///
/// The blocking entry points drive their own runtime and must not be called
/// from inside an async task.
#[derive(Debug)]
pub struct Searcher {
    options: SearchOptions,
    executor: Executor,
}

impl Searcher {
    pub fn new(options: SearchOptions) -> Self {
        let executor = Executor::new(
            options.strategy,
            options.thread_count,
            options.io_thread_count,
        );
        Self { options, executor }
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Total occurrences of `target` in the tree
    pub fn search(&self, folder: &Folder, target: &str) -> TreeResult<usize> {
        Ok(self.search_detailed(folder, target)?.total_matches)
    }

    /// Per-document occurrences of `target`, for documents with at least one match
    pub fn search_detailed(&self, folder: &Folder, target: &str) -> TreeResult<SearchReport> {
        self.search_with_cancel(folder, target, &CancellationToken::new())
    }

    pub fn search_with_cancel(
        &self,
        folder: &Folder,
        target: &str,
        cancel: &CancellationToken,
    ) -> TreeResult<SearchReport> {
        info!(
            "Searching {} for {:?} ({} strategy)",
            folder.path().display(),
            target,
            self.executor.strategy()
        );

        let matcher = PhraseMatcher::new(
            target,
            self.options.word_boundary,
            self.options.case_sensitive,
        );
        if matcher.is_empty() {
            warn!("Search target {:?} contains no words", target);
            return Ok(SearchReport::new(target));
        }

        let scan: ScanFn = Arc::new(move |text: &str| matcher.count(text));
        let mut report = SearchReport::new(target);
        for (path, occurrences) in self.scan_documents(folder, scan, cancel)? {
            report.record(path, occurrences);
        }
        let report = report.finish();

        info!(
            "Search complete. Found {} matches in {} of {} documents",
            report.total_matches, report.documents_with_matches, report.documents_searched
        );
        Ok(report)
    }

    /// Total number of lines across all documents in the tree
    pub fn count_lines(&self, folder: &Folder) -> TreeResult<u64> {
        let scan: ScanFn = Arc::new(line_count);
        let per_document = self.scan_documents(folder, scan, &CancellationToken::new())?;
        Ok(per_document.iter().map(|(_, lines)| *lines as u64).sum())
    }

    fn scan_documents(
        &self,
        folder: &Folder,
        scan: ScanFn,
        cancel: &CancellationToken,
    ) -> TreeResult<Vec<(PathBuf, usize)>> {
        let documents: Vec<&Document> = traversal::documents(folder).collect();
        debug!(
            "Scanning {} documents with {} strategy",
            documents.len(),
            self.executor.strategy()
        );

        match self.executor.strategy() {
            Strategy::Sequential => documents
                .iter()
                .map(|document| -> TreeResult<(PathBuf, usize)> {
                    cancel.check()?;
                    let found = scan(document.content()?);
                    Ok((document.path().to_path_buf(), found))
                })
                .collect(),
            Strategy::Parallel => {
                let pools = self.executor.pools()?;
                pools.cpu.install(|| {
                    documents
                        .par_iter()
                        .map(|document| -> TreeResult<(PathBuf, usize)> {
                            cancel.check()?;
                            let text = if document.is_loaded() {
                                document.content()?
                            } else {
                                pools.io.install(|| document.content())?
                            };
                            Ok((document.path().to_path_buf(), scan(text)))
                        })
                        .collect()
                })
            }
            Strategy::Futures => self
                .executor
                .runtime()?
                .block_on(scan_joined(&documents, scan, cancel)),
            Strategy::Reactive => self.executor.runtime()?.block_on(scan_streamed(
                &documents,
                scan,
                cancel,
                self.options.thread_count.get(),
            )),
        }
    }
}

/// One task per document, gathered through a `JoinSet`
async fn scan_joined(
    documents: &[&Document],
    scan: ScanFn,
    cancel: &CancellationToken,
) -> TreeResult<Vec<(PathBuf, usize)>> {
    let mut tasks = JoinSet::new();
    for (index, document) in documents.iter().enumerate() {
        cancel.check()?;
        let job = DocumentJob::of(document);
        let scan = Arc::clone(&scan);
        let cancel = cancel.clone();
        if job.needs_read() {
            tasks.spawn_blocking(move || job.run(&scan, &cancel).map(|r| (index, r)));
        } else {
            tasks.spawn(async move { job.run(&scan, &cancel).map(|r| (index, r)) });
        }
    }

    let mut results = Vec::with_capacity(documents.len());
    while let Some(joined) = tasks.join_next().await {
        let (index, (text, found)) = joined.map_err(TreeError::from_join)??;
        documents[index].prime(text);
        results.push((documents[index].path().to_path_buf(), found));
    }
    Ok(results)
}

/// Documents emitted by a cold stream, at most `concurrency` in flight
async fn scan_streamed(
    documents: &[&Document],
    scan: ScanFn,
    cancel: &CancellationToken,
    concurrency: usize,
) -> TreeResult<Vec<(PathBuf, usize)>> {
    stream::iter(documents.iter().enumerate())
        .map(|(index, document)| {
            let job = DocumentJob::of(document);
            let scan = Arc::clone(&scan);
            let cancel = cancel.clone();
            async move {
                let handle = if job.needs_read() {
                    tokio::task::spawn_blocking(move || job.run(&scan, &cancel))
                } else {
                    tokio::spawn(async move { job.run(&scan, &cancel) })
                };
                AbortOnDrop::new(handle)
                    .await
                    .map_err(TreeError::from_join)?
                    .map(|r| (index, r))
            }
        })
        .buffer_unordered(concurrency)
        .map_ok(|(index, (text, found))| {
            documents[index].prime(text);
            (documents[index].path().to_path_buf(), found)
        })
        .try_collect()
        .await
}

/// Lines in `text`; a trailing line break does not start a new line
pub fn line_count(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    let breaks = LINE_BREAK.find_iter(text).count();
    if text.ends_with(['\n', '\r']) {
        breaks
    } else {
        breaks + 1
    }
}
