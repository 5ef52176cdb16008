//! Builds an immutable [`Folder`] tree from a directory on disk.
//!
//! One algorithm, four schedules: list the children of a folder, classify
//! them, recurse into sub-folders (fan-out), collect the finished children
//! (fan-in) and derive the folder's size. The sequential and parallel
//! strategies share [`scheduler::build_folder`]; the futures and reactive
//! strategies share the listing and loading steps but compose the fan-out
//! with tasks and streams respectively.
//!
//! Builds fail fast. The first error cancels the build's own run token, so
//! work still in flight stops at its next checkpoint, and no partial tree is
//! ever returned.
mod composed;
mod listing;
mod reactive;
mod scheduler;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::cancel::CancellationToken;
use crate::config::BuildOptions;
use crate::errors::TreeResult;
use crate::executor::{Executor, Strategy};
use crate::filters::EntryFilter;
use crate::metrics::BuildMetrics;
use crate::tree::Folder;

/// Everything one build run shares between its units of work
#[derive(Debug)]
pub(crate) struct BuildContext {
    pub(crate) options: BuildOptions,
    pub(crate) filter: EntryFilter,
    pub(crate) cancel: CancellationToken,
    pub(crate) metrics: BuildMetrics,
    /// Children processed at once per folder by the reactive strategy
    pub(crate) concurrency: usize,
    /// Fired once a folder listing completes, to cancel at a known point
    #[cfg(test)]
    pub(crate) cancel_after_listing: Option<CancellationToken>,
}

impl BuildContext {
    pub(crate) fn new(options: BuildOptions, cancel: CancellationToken) -> TreeResult<Self> {
        let filter = EntryFilter::new(&options.ignore_patterns, options.skip_hidden)?;
        Ok(Self::with_parts(options, filter, cancel, BuildMetrics::new()))
    }

    fn with_parts(
        options: BuildOptions,
        filter: EntryFilter,
        cancel: CancellationToken,
        metrics: BuildMetrics,
    ) -> Self {
        let concurrency = options.thread_count.get();
        Self {
            options,
            filter,
            cancel,
            metrics,
            concurrency,
            #[cfg(test)]
            cancel_after_listing: None,
        }
    }
}

/// Reusable builder that keeps its worker pools alive between builds
#[derive(Debug)]
pub struct TreeBuilder {
    options: BuildOptions,
    filter: EntryFilter,
    executor: Executor,
    metrics: BuildMetrics,
}

impl TreeBuilder {
    /// Validates the ignore patterns; pools are created on the first build that needs them
    pub fn new(options: BuildOptions) -> TreeResult<Self> {
        let filter = EntryFilter::new(&options.ignore_patterns, options.skip_hidden)?;
        let executor = Executor::new(
            options.strategy,
            options.thread_count,
            options.io_thread_count,
        );
        Ok(Self {
            options,
            filter,
            executor,
            metrics: BuildMetrics::new(),
        })
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Counters accumulated over every build run by this builder
    pub fn metrics(&self) -> &BuildMetrics {
        &self.metrics
    }

    pub fn build(&self, root: impl AsRef<Path>) -> TreeResult<Folder> {
        self.build_with_cancel(root, &CancellationToken::new())
    }

    /// Builds the tree rooted at `root`, giving up with [`TreeError::Cancelled`]
    /// once `cancel` fires.
    ///
    /// Must not be called from inside an async task; use [`build_async`] there.
    ///
    /// [`TreeError::Cancelled`]: crate::errors::TreeError::Cancelled
    pub fn build_with_cancel(
        &self,
        root: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> TreeResult<Folder> {
        let root = root.as_ref().to_path_buf();
        let strategy = self.executor.strategy();
        info!("Building tree from {} ({} strategy)", root.display(), strategy);
        let start = Instant::now();

        let run = cancel.child();
        let ctx = Arc::new(self.context(run.clone()));
        let result = self.run(root, &ctx);
        finish(result, &run, &self.metrics, start)
    }

    fn context(&self, run: CancellationToken) -> BuildContext {
        BuildContext::with_parts(
            self.options.clone(),
            self.filter.clone(),
            run,
            self.metrics.clone(),
        )
    }

    fn run(&self, root: PathBuf, ctx: &Arc<BuildContext>) -> TreeResult<Folder> {
        match self.executor.strategy() {
            Strategy::Sequential => scheduler::build_folder(&scheduler::Sequential, root, ctx),
            Strategy::Parallel => {
                let pools = self.executor.pools()?;
                pools
                    .cpu
                    .install(|| scheduler::build_folder(pools, root, ctx))
            }
            Strategy::Futures => self
                .executor
                .runtime()?
                .block_on(composed::build_folder(root, Arc::clone(ctx))),
            Strategy::Reactive => self
                .executor
                .runtime()?
                .block_on(reactive::build_folder(root, Arc::clone(ctx))),
        }
    }
}

fn finish(
    result: TreeResult<Folder>,
    run: &CancellationToken,
    metrics: &BuildMetrics,
    start: Instant,
) -> TreeResult<Folder> {
    match result {
        Ok(folder) => {
            info!(
                "Built tree of {} entries in {:?}",
                folder.size(),
                start.elapsed()
            );
            metrics.log_stats();
            Ok(folder)
        }
        Err(e) => {
            run.cancel();
            warn!("Build failed after {:?}: {}", start.elapsed(), e);
            Err(e)
        }
    }
}

/// Builds the tree rooted at `root` with a one-off [`TreeBuilder`]
pub fn build(root: impl AsRef<Path>, options: &BuildOptions) -> TreeResult<Folder> {
    TreeBuilder::new(options.clone())?.build(root)
}

/// Builds on the caller's tokio runtime.
///
/// The futures and reactive strategies compose directly on that runtime;
/// the sequential and parallel strategies run on its blocking pool.
pub async fn build_async(
    root: PathBuf,
    options: BuildOptions,
    cancel: CancellationToken,
) -> TreeResult<Folder> {
    match options.strategy {
        Strategy::Futures | Strategy::Reactive => {
            info!(
                "Building tree from {} ({} strategy, caller's runtime)",
                root.display(),
                options.strategy
            );
            let start = Instant::now();
            let run = cancel.child();
            let strategy = options.strategy;
            let ctx = Arc::new(BuildContext::new(options, run.clone())?);
            let result = if strategy == Strategy::Futures {
                composed::build_folder(root, Arc::clone(&ctx)).await
            } else {
                reactive::build_folder(root, Arc::clone(&ctx)).await
            };
            finish(result, &run, &ctx.metrics, start)
        }
        Strategy::Sequential | Strategy::Parallel => listing::joined(
            tokio::task::spawn_blocking(move || -> TreeResult<Folder> {
                TreeBuilder::new(options)?.build_with_cancel(root, &cancel)
            })
            .await,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TreeError;
    use std::fs;
    use std::num::NonZeroUsize;
    use tempfile::tempdir;

    fn options(strategy: Strategy) -> BuildOptions {
        BuildOptions {
            thread_count: NonZeroUsize::new(2).unwrap(),
            io_thread_count: NonZeroUsize::new(2).unwrap(),
            ..BuildOptions::default()
        }
        .with_strategy(strategy)
    }

    #[test]
    fn test_build_scenario_every_strategy() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "the cat sat").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.txt"), "the cat ran").unwrap();

        for strategy in Strategy::ALL {
            let builder = TreeBuilder::new(options(strategy)).unwrap();
            let root = builder.build(dir.path()).unwrap();
            assert_eq!(root.size(), 4, "strategy {}", strategy);
            assert_eq!(root.documents().len(), 1);
            assert_eq!(root.sub_folders().len(), 1);
            assert_eq!(root.sub_folders()[0].size(), 2);

            let stats = builder.metrics().get_stats();
            assert_eq!(stats.folders_listed, 2);
            assert_eq!(stats.documents_created, 2);
            assert_eq!(stats.bytes_read, 22);
        }
    }

    #[test]
    fn test_builder_is_reusable() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "x").unwrap();

        let builder = TreeBuilder::new(options(Strategy::Parallel)).unwrap();
        assert_eq!(builder.build(dir.path()).unwrap().size(), 2);
        assert_eq!(builder.build(dir.path()).unwrap().size(), 2);
        assert_eq!(builder.metrics().get_stats().folders_listed, 2);
    }

    #[test]
    fn test_invalid_ignore_pattern_rejected_up_front() {
        let options = BuildOptions {
            ignore_patterns: vec!["[".to_string()],
            ..BuildOptions::default()
        };
        assert!(matches!(TreeBuilder::new(options), Err(TreeError::Config(_))));
    }

    #[test]
    fn test_cancel_after_first_listing_every_strategy() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "the cat sat").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.txt"), "the cat ran").unwrap();

        for strategy in Strategy::ALL {
            let builder = TreeBuilder::new(options(strategy)).unwrap();
            let caller = CancellationToken::new();
            let ctx = Arc::new(BuildContext {
                cancel_after_listing: Some(caller.clone()),
                ..builder.context(caller.child())
            });

            let err = builder.run(dir.path().to_path_buf(), &ctx).unwrap_err();
            assert!(err.is_cancelled(), "strategy {}: {}", strategy, err);
            assert_eq!(
                builder.metrics().get_stats().folders_listed,
                1,
                "strategy {}",
                strategy
            );
        }
    }

    #[test]
    fn test_failed_build_does_not_cancel_caller_token() {
        let dir = tempdir().unwrap();
        let caller = CancellationToken::new();
        let builder = TreeBuilder::new(options(Strategy::Futures)).unwrap();

        let err = builder
            .build_with_cancel(dir.path().join("missing"), &caller)
            .unwrap_err();
        assert!(matches!(err, TreeError::NotFound(_)));
        assert!(!caller.is_cancelled());
    }
}
