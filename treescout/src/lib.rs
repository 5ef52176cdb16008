//! Concurrent directory-tree builder and traversal engine.
//!
//! [`build`] turns a directory into an immutable [`Folder`] tree; [`count`],
//! [`search`] and [`count_lines`] query it. Every operation gives the same
//! result under each [`Strategy`]: sequential, a rayon worker pool, tokio
//! tasks composed as futures, or a reactive stream.
//!
//! ```no_run
//! use treescout::{build, search, BuildOptions, SearchOptions, Strategy};
//!
//! let options = BuildOptions::default().with_strategy(Strategy::Parallel);
//! let root = build("works", &options)?;
//! println!("{} entries", root.size());
//!
//! let hits = search(&root, "whale", &SearchOptions::default())?;
//! println!("{} occurrences", hits);
//! # Ok::<(), treescout::TreeError>(())
//! ```
pub mod builder;
pub mod cancel;
pub mod config;
pub mod errors;
pub mod executor;
pub mod filters;
pub mod metrics;
pub mod results;
pub mod search;
pub mod traversal;
pub mod tree;

pub use builder::{build, build_async, TreeBuilder};
pub use cancel::CancellationToken;
pub use config::{BuildOptions, CliOverrides, ContentMode, ScoutConfig, SearchOptions};
pub use errors::{TreeError, TreeResult};
pub use executor::Strategy;
pub use metrics::{BuildMetrics, BuildStats};
pub use results::{DocumentHits, SearchReport};
pub use search::{count_lines, search, search_detailed, Searcher, WordBoundary};
pub use traversal::{breadth_first, count, documents, entries, par_count};
pub use tree::{Document, EncodingMode, Entry, Folder};
