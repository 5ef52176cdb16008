use rayon::prelude::*;
use std::path::PathBuf;
use tracing::trace;

use super::listing::{self, Child};
use super::BuildContext;
use crate::errors::TreeResult;
use crate::executor::WorkerPools;
use crate::tree::{Built, Folder};

/// Runs the units of work of one fan-out step.
///
/// `run_all` resolves every job or returns the first error. `blocking_io`
/// runs a filesystem call where it cannot starve CPU workers.
pub(crate) trait Scheduler: Sync {
    fn run_all<T, F>(&self, jobs: Vec<F>) -> TreeResult<Vec<T>>
    where
        F: FnOnce() -> TreeResult<T> + Send,
        T: Send;

    fn blocking_io<T, F>(&self, f: F) -> TreeResult<T>
    where
        F: FnOnce() -> TreeResult<T> + Send,
        T: Send;
}

/// Everything on the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Sequential;

impl Scheduler for Sequential {
    fn run_all<T, F>(&self, jobs: Vec<F>) -> TreeResult<Vec<T>>
    where
        F: FnOnce() -> TreeResult<T> + Send,
        T: Send,
    {
        jobs.into_iter().map(|job| job()).collect()
    }

    fn blocking_io<T, F>(&self, f: F) -> TreeResult<T>
    where
        F: FnOnce() -> TreeResult<T> + Send,
        T: Send,
    {
        f()
    }
}

/// Jobs spread over the CPU pool, filesystem calls on the I/O pool.
///
/// Callers must already be running inside `cpu`. While a CPU worker waits
/// on the I/O pool it keeps stealing CPU jobs, so a deep tree of blocked
/// parents cannot exhaust the CPU pool.
impl Scheduler for WorkerPools {
    fn run_all<T, F>(&self, jobs: Vec<F>) -> TreeResult<Vec<T>>
    where
        F: FnOnce() -> TreeResult<T> + Send,
        T: Send,
    {
        jobs.into_par_iter().map(|job| job()).collect()
    }

    fn blocking_io<T, F>(&self, f: F) -> TreeResult<T>
    where
        F: FnOnce() -> TreeResult<T> + Send,
        T: Send,
    {
        self.io.install(f)
    }
}

/// Builds the folder at `path`: list, fan out over children, fan in
pub(crate) fn build_folder<S: Scheduler>(
    scheduler: &S,
    path: PathBuf,
    ctx: &BuildContext,
) -> TreeResult<Folder> {
    ctx.cancel.check()?;
    let children = scheduler.blocking_io(|| listing::list_children(&path, ctx))?;

    let jobs: Vec<_> = children
        .into_iter()
        .map(|child| move || build_child(scheduler, child, ctx))
        .collect();
    let built = scheduler.run_all(jobs)?;

    let folder = Folder::from_built(path, built);
    trace!("Built {} ({} entries)", folder.path().display(), folder.size());
    Ok(folder)
}

fn build_child<S: Scheduler>(scheduler: &S, child: Child, ctx: &BuildContext) -> TreeResult<Built> {
    match child {
        Child::Folder(path) => build_folder(scheduler, path, ctx).map(Built::Folder),
        Child::Document(path) => scheduler
            .blocking_io(|| listing::load_document(path, ctx))
            .map(Built::Document),
    }
}
