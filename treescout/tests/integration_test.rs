use anyhow::Result;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tempfile::tempdir;
use treescout::{
    build, build_async, count, count_lines, par_count, search, search_detailed, BuildOptions,
    CancellationToken, ContentMode, Folder, SearchOptions, Strategy, TreeBuilder, TreeError,
    WordBoundary,
};

fn build_options(strategy: Strategy) -> BuildOptions {
    BuildOptions {
        thread_count: NonZeroUsize::new(4).unwrap(),
        io_thread_count: NonZeroUsize::new(4).unwrap(),
        ..BuildOptions::default()
    }
    .with_strategy(strategy)
}

fn search_options(strategy: Strategy) -> SearchOptions {
    SearchOptions {
        thread_count: NonZeroUsize::new(4).unwrap(),
        io_thread_count: NonZeroUsize::new(4).unwrap(),
        ..SearchOptions::default()
    }
    .with_strategy(strategy)
}

/// root/{a.txt: "the cat sat", sub/{b.txt: "the cat ran"}}
fn create_scenario(dir: &Path) -> Result<()> {
    fs::write(dir.join("a.txt"), "the cat sat")?;
    fs::create_dir(dir.join("sub"))?;
    fs::write(dir.join("sub/b.txt"), "the cat ran")?;
    Ok(())
}

/// A few levels of folders, each with a handful of documents
fn create_nested_tree(dir: &Path, depth: usize, width: usize) -> Result<()> {
    for i in 0..width {
        let mut file = File::create(dir.join(format!("doc_{}.txt", i)))?;
        writeln!(file, "the whale surfaced near doc {}", i)?;
        writeln!(file, "Call me Ishmael. The whale, the whale!")?;
    }
    if depth > 0 {
        for i in 0..width {
            let sub = dir.join(format!("dir_{}", i));
            fs::create_dir(&sub)?;
            create_nested_tree(&sub, depth - 1, width)?;
        }
    }
    Ok(())
}

fn entry_paths(folder: &Folder) -> BTreeSet<PathBuf> {
    folder.entries().map(|e| e.path().to_path_buf()).collect()
}

#[test]
fn test_scenario_every_strategy() -> Result<()> {
    let dir = tempdir()?;
    create_scenario(dir.path())?;

    for strategy in Strategy::ALL {
        let root = build(dir.path(), &build_options(strategy))?;
        assert_eq!(count(&root), 4, "strategy {}", strategy);
        assert_eq!(search(&root, "cat", &search_options(strategy))?, 2);
    }
    Ok(())
}

#[test]
fn test_results_identical_across_strategies() -> Result<()> {
    let dir = tempdir()?;
    create_nested_tree(dir.path(), 2, 3)?;

    let reference = build(dir.path(), &build_options(Strategy::Sequential))?;
    let expected_paths = entry_paths(&reference);
    let expected_hits = search_detailed(&reference, "whale", &search_options(Strategy::Sequential))?;

    for strategy in Strategy::ALL {
        let root = build(dir.path(), &build_options(strategy))?;
        assert_eq!(root.size(), reference.size(), "strategy {}", strategy);
        assert_eq!(entry_paths(&root), expected_paths, "strategy {}", strategy);

        let report = search_detailed(&root, "whale", &search_options(strategy))?;
        assert_eq!(report.total_matches, expected_hits.total_matches);
        assert_eq!(report.hits, expected_hits.hits, "strategy {}", strategy);
    }
    Ok(())
}

#[test]
fn test_size_invariant_holds_everywhere() -> Result<()> {
    let dir = tempdir()?;
    create_nested_tree(dir.path(), 2, 3)?;
    let root = build(dir.path(), &build_options(Strategy::Parallel))?;

    fn check(folder: &Folder) {
        let children: u64 = folder.sub_folders().iter().map(Folder::size).sum::<u64>()
            + folder.documents().len() as u64;
        assert_eq!(folder.size(), 1 + children, "{}", folder.path().display());
        folder.sub_folders().iter().for_each(check);
    }
    check(&root);

    assert_eq!(count(&root), root.size());
    assert_eq!(par_count(&root), root.size());
    assert_eq!(root.entries().len() as u64, root.size());
    Ok(())
}

#[test]
fn test_search_is_additive() -> Result<()> {
    let dir = tempdir()?;
    create_nested_tree(dir.path(), 1, 3)?;
    let root = build(dir.path(), &build_options(Strategy::Sequential))?;
    let options = search_options(Strategy::Sequential);

    let total = search(&root, "whale", &options)?;
    let mut parts = 0;
    for document in root.documents() {
        parts += treescout::search::PhraseMatcher::new("whale", WordBoundary::Trimmed, true)
            .count(document.content()?);
    }
    for sub in root.sub_folders() {
        parts += search(sub, "whale", &options)?;
    }
    assert_eq!(total, parts);
    assert_eq!(total, 12 * 3);
    Ok(())
}

#[test]
fn test_traversal_is_idempotent() -> Result<()> {
    let dir = tempdir()?;
    create_nested_tree(dir.path(), 1, 2)?;
    let root = build(dir.path(), &build_options(Strategy::Futures))?;

    assert_eq!(entry_paths(&root), entry_paths(&root));
    let breadth: BTreeSet<PathBuf> = root
        .breadth_first()
        .map(|e| e.path().to_path_buf())
        .collect();
    assert_eq!(breadth, entry_paths(&root));

    let options = search_options(Strategy::Reactive);
    assert_eq!(search(&root, "whale", &options)?, search(&root, "whale", &options)?);
    Ok(())
}

#[test]
fn test_empty_directory() -> Result<()> {
    let dir = tempdir()?;
    for strategy in Strategy::ALL {
        let root = build(dir.path(), &build_options(strategy))?;
        assert_eq!(root.size(), 1);
        assert!(root.sub_folders().is_empty());
        assert!(root.documents().is_empty());
        assert_eq!(search(&root, "anything", &search_options(strategy))?, 0);
    }
    Ok(())
}

#[test]
fn test_literal_matching() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("a.txt"), "cat cot c.t c*t cccct")?;
    let root = build(dir.path(), &build_options(Strategy::Sequential))?;
    let options = SearchOptions {
        word_boundary: WordBoundary::Whitespace,
        ..search_options(Strategy::Parallel)
    };

    assert_eq!(search(&root, "c.t", &options)?, 1);
    assert_eq!(search(&root, "c*t", &options)?, 1);
    assert_eq!(search(&root, ".*", &options)?, 0);
    Ok(())
}

#[test]
fn test_line_counts_match_across_strategies() -> Result<()> {
    let dir = tempdir()?;
    create_nested_tree(dir.path(), 1, 2)?;
    fs::write(dir.path().join("mixed.txt"), "one\r\ntwo\rthree\nfour")?;
    let root = build(dir.path(), &build_options(Strategy::Sequential))?;

    // 6 documents of 2 lines each, plus the mixed one
    for strategy in Strategy::ALL {
        assert_eq!(count_lines(&root, &search_options(strategy))?, 16);
    }
    Ok(())
}

#[test]
fn test_pre_cancelled_build() -> Result<()> {
    let dir = tempdir()?;
    create_scenario(dir.path())?;
    let cancel = CancellationToken::new();
    cancel.cancel();

    for strategy in Strategy::ALL {
        let builder = TreeBuilder::new(build_options(strategy))?;
        let err = builder.build_with_cancel(dir.path(), &cancel).unwrap_err();
        assert!(err.is_cancelled(), "strategy {}", strategy);
    }
    Ok(())
}

#[test]
fn test_mid_flight_cancel_never_yields_inconsistent_tree() -> Result<()> {
    let dir = tempdir()?;
    create_nested_tree(dir.path(), 3, 4)?;

    for strategy in Strategy::ALL {
        let builder = TreeBuilder::new(build_options(strategy))?;
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(2));
            trigger.cancel();
        });

        match builder.build_with_cancel(dir.path(), &cancel) {
            Ok(root) => assert_eq!(root.entries().count() as u64, root.size()),
            Err(err) => assert!(err.is_cancelled(), "strategy {}: {}", strategy, err),
        }
        canceller.join().unwrap();
    }
    Ok(())
}

#[test]
fn test_missing_root() -> Result<()> {
    let dir = tempdir()?;
    for strategy in Strategy::ALL {
        let err = build(dir.path().join("missing"), &build_options(strategy)).unwrap_err();
        assert!(matches!(err, TreeError::NotFound(_)), "strategy {}", strategy);
        assert!(err.is_io());
    }
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_dangling_symlink_fails_build() -> Result<()> {
    let dir = tempdir()?;
    create_scenario(dir.path())?;
    std::os::unix::fs::symlink(dir.path().join("nowhere"), dir.path().join("sub/broken"))?;

    for strategy in Strategy::ALL {
        let err = build(dir.path(), &build_options(strategy)).unwrap_err();
        assert!(
            matches!(err, TreeError::Classification(_)),
            "strategy {}: {}",
            strategy,
            err
        );
    }
    Ok(())
}

#[test]
fn test_lazy_content() -> Result<()> {
    let dir = tempdir()?;
    create_scenario(dir.path())?;
    let options = BuildOptions {
        content_mode: ContentMode::Lazy,
        ..build_options(Strategy::Parallel)
    };
    let root = build(dir.path(), &options)?;

    assert!(root.documents().iter().all(|d| !d.is_loaded()));
    assert_eq!(search(&root, "cat", &search_options(Strategy::Futures))?, 2);
    assert!(treescout::documents(&root).all(|d| d.is_loaded()));
    Ok(())
}

#[test]
fn test_ignore_patterns_and_hidden_entries() -> Result<()> {
    let dir = tempdir()?;
    create_scenario(dir.path())?;
    fs::create_dir(dir.path().join("target"))?;
    fs::write(dir.path().join("target/out.txt"), "cat")?;
    fs::write(dir.path().join(".hidden"), "cat")?;

    let options = BuildOptions {
        ignore_patterns: vec!["target".to_string()],
        skip_hidden: true,
        ..build_options(Strategy::Reactive)
    };
    let root = build(dir.path(), &options)?;
    assert_eq!(root.size(), 4);
    assert_eq!(search(&root, "cat", &search_options(Strategy::Sequential))?, 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_build_async_on_callers_runtime() -> Result<()> {
    let dir = tempdir()?;
    create_scenario(dir.path())?;

    for strategy in Strategy::ALL {
        let root = build_async(
            dir.path().to_path_buf(),
            build_options(strategy),
            CancellationToken::new(),
        )
        .await?;
        assert_eq!(root.size(), 4, "strategy {}", strategy);
    }
    Ok(())
}
