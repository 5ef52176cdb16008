//! Concurrency back-ends shared by the builder and the search engine.
//!
//! The [`Executor`] owns the only shared mutable resources in the crate:
//! bounded worker pools. CPU work runs on a rayon pool of `thread_count`
//! workers (parallel strategy) or on a tokio multi-thread runtime with the
//! same number of workers (futures and reactive strategies). Blocking
//! filesystem calls never run on those workers directly; they go to a
//! dedicated I/O pool of `io_thread_count` threads, either a second rayon
//! pool or tokio's blocking pool. Pools are created on first use, so a
//! sequential executor never spawns a thread.
use once_cell::sync::OnceCell;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::num::NonZeroUsize;
use std::pin::Pin;
use std::str::FromStr;
use std::task::{Context, Poll};
use tokio::runtime::Runtime;
use tokio::task::{JoinError, JoinHandle};
use tracing::debug;

use crate::errors::{TreeError, TreeResult};

/// How fan-out work is scheduled. All strategies produce the same results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One child at a time on the calling thread
    #[default]
    Sequential,
    /// Children fan out across a rayon worker pool; the caller blocks until all resolve
    Parallel,
    /// Each child is a tokio task; the parent resolves when every child task has
    Futures,
    /// Children are emitted by a cold stream and processed with bounded concurrency
    Reactive,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Sequential,
        Strategy::Parallel,
        Strategy::Futures,
        Strategy::Reactive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::Parallel => "parallel",
            Strategy::Futures => "futures",
            Strategy::Reactive => "reactive",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" | "seq" => Ok(Strategy::Sequential),
            "parallel" | "par" => Ok(Strategy::Parallel),
            "futures" | "future" | "async" => Ok(Strategy::Futures),
            "reactive" | "stream" => Ok(Strategy::Reactive),
            other => Err(TreeError::config_error(format!(
                "Unknown strategy '{}' (expected sequential, parallel, futures or reactive)",
                other
            ))),
        }
    }
}

/// Rayon pools used by the parallel strategy
#[derive(Debug)]
pub struct WorkerPools {
    pub(crate) cpu: ThreadPool,
    pub(crate) io: ThreadPool,
}

impl WorkerPools {
    pub fn new(thread_count: NonZeroUsize, io_thread_count: NonZeroUsize) -> TreeResult<Self> {
        let cpu = ThreadPoolBuilder::new()
            .num_threads(thread_count.get())
            .thread_name(|i| format!("treescout-cpu-{}", i))
            .build()
            .map_err(|e| TreeError::pool_error(e.to_string()))?;
        let io = ThreadPoolBuilder::new()
            .num_threads(io_thread_count.get())
            .thread_name(|i| format!("treescout-io-{}", i))
            .build()
            .map_err(|e| TreeError::pool_error(e.to_string()))?;

        debug!(
            "Created rayon pools: {} CPU workers, {} I/O workers",
            thread_count, io_thread_count
        );
        Ok(Self { cpu, io })
    }
}

/// Owns the worker pools for one strategy and hands them out on demand
#[derive(Debug)]
pub struct Executor {
    strategy: Strategy,
    thread_count: NonZeroUsize,
    io_thread_count: NonZeroUsize,
    pools: OnceCell<WorkerPools>,
    runtime: OnceCell<Runtime>,
}

impl Executor {
    pub fn new(strategy: Strategy, thread_count: NonZeroUsize, io_thread_count: NonZeroUsize) -> Self {
        Self {
            strategy,
            thread_count,
            io_thread_count,
            pools: OnceCell::new(),
            runtime: OnceCell::new(),
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn thread_count(&self) -> NonZeroUsize {
        self.thread_count
    }

    /// The rayon CPU and I/O pools, created on first call
    pub fn pools(&self) -> TreeResult<&WorkerPools> {
        self.pools
            .get_or_try_init(|| WorkerPools::new(self.thread_count, self.io_thread_count))
    }

    /// The tokio runtime, created on first call. Its blocking pool is the I/O pool.
    pub fn runtime(&self) -> TreeResult<&Runtime> {
        self.runtime.get_or_try_init(|| {
            debug!(
                "Creating tokio runtime: {} workers, {} blocking threads",
                self.thread_count, self.io_thread_count
            );
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(self.thread_count.get())
                .max_blocking_threads(self.io_thread_count.get())
                .thread_name("treescout-async")
                .build()
                .map_err(|e| TreeError::pool_error(format!("Failed to create async runtime: {}", e)))
        })
    }
}

/// Handle to a spawned task that aborts the task when dropped unfinished.
///
/// Stream combinators such as `buffer_unordered` drop their pending futures
/// when the stream is abandoned; wrapping each spawned stage keeps those
/// tasks from running on detached.
pub(crate) struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> AbortOnDrop<T> {
    pub(crate) fn new(handle: JoinHandle<T>) -> Self {
        Self(handle)
    }
}

impl<T> Future for AbortOnDrop<T> {
    type Output = Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}
