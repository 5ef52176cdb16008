use clap::{Parser, Subcommand};
use colored::Colorize;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::debug;
use treescout::{
    build, count, count_lines, search_detailed, CliOverrides, ContentMode, EncodingMode, Folder,
    ScoutConfig, SearchReport, Strategy, TreeError, WordBoundary,
};

type Result<T> = std::result::Result<T, TreeError>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (YAML), layered over the global and local ones
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log build and search progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
struct TreeArgs {
    /// Root directory to build the tree from [default: configured root_path, else .]
    #[arg(short = 'd', long)]
    root: Option<PathBuf>,

    /// Scheduling strategy (sequential|parallel|futures|reactive)
    #[arg(short = 's', long)]
    strategy: Option<Strategy>,

    /// Number of worker threads to use
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Patterns to ignore (glob format)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Skip entries whose name starts with a dot
    #[arg(long)]
    skip_hidden: bool,

    /// Read documents on first use instead of while building
    #[arg(long)]
    lazy: bool,

    /// Replace invalid UTF-8 instead of failing
    #[arg(long)]
    lossy: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Count the entries (folders and documents) in a tree
    Count(TreeArgs),

    /// Count occurrences of words or phrases
    Search {
        #[command(flatten)]
        tree: TreeArgs,

        /// Word or phrase to search for (can be specified multiple times)
        #[arg(short = 'w', long = "word", required = true)]
        words: Vec<String>,

        /// Show only totals, not per-document hits
        #[arg(long)]
        stats: bool,

        /// Print the reports as JSON
        #[arg(long)]
        json: bool,

        /// Compare words case-insensitively
        #[arg(long, conflicts_with = "case_sensitive")]
        ignore_case: bool,

        /// Compare words case-sensitively, even if the configuration says otherwise
        #[arg(long)]
        case_sensitive: bool,

        /// How text is split into words (trimmed|whitespace|unicode)
        #[arg(long)]
        boundary: Option<String>,
    },

    /// Count the lines of every document in a tree
    Lines(TreeArgs),

    /// Run every strategy on the same tree and check they agree
    Compare {
        #[command(flatten)]
        tree: TreeArgs,

        /// Word to search for with each strategy
        #[arg(short = 'w', long = "word")]
        word: Option<String>,
    },

    /// Print the effective configuration
    Config(TreeArgs),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {}", "error:".red(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Count(ref args) => {
            let config = load_config(&cli, args, None, None)?;
            let root = build(&config.root_path, &config.build_options())?;
            println!(
                "{} entries in {}",
                count(&root).to_string().green(),
                root.path().display().to_string().blue()
            );
            Ok(())
        }
        Commands::Search {
            ref tree,
            ref words,
            stats,
            json,
            ignore_case,
            case_sensitive,
            ref boundary,
        } => {
            let boundary = boundary.as_deref().map(parse_boundary).transpose()?;
            let case_sensitive = match (ignore_case, case_sensitive) {
                (true, _) => Some(false),
                (_, true) => Some(true),
                _ => None,
            };
            let config = load_config(&cli, tree, boundary, case_sensitive)?;
            let root = build(&config.root_path, &config.build_options())?;

            let reports = words
                .iter()
                .map(|word| search_detailed(&root, word, &config.search_options()))
                .collect::<Result<Vec<_>>>()?;

            if json {
                let rendered = serde_json::to_string_pretty(&reports).map_err(|e| {
                    TreeError::config_error(format!("Failed to render JSON: {}", e))
                })?;
                println!("{}", rendered);
            } else {
                for report in &reports {
                    print_search_report(report, stats);
                }
            }
            Ok(())
        }
        Commands::Lines(ref args) => {
            let config = load_config(&cli, args, None, None)?;
            let root = build(&config.root_path, &config.build_options())?;
            let lines = count_lines(&root, &config.search_options())?;
            println!(
                "{} lines in {} documents",
                lines.to_string().green(),
                treescout::documents(&root).count()
            );
            Ok(())
        }
        Commands::Compare { ref tree, ref word } => {
            let config = load_config(&cli, tree, None, None)?;
            compare_strategies(&config, word.as_deref())
        }
        Commands::Config(ref args) => {
            let config = load_config(&cli, args, None, None)?;
            print!("{}", config.to_yaml()?);
            Ok(())
        }
    }
}

/// File configuration with command-line values layered on top
fn load_config(
    cli: &Cli,
    args: &TreeArgs,
    boundary: Option<WordBoundary>,
    case_sensitive: Option<bool>,
) -> Result<ScoutConfig> {
    let file_config = ScoutConfig::load_from(cli.config.as_deref())
        .map_err(|e| TreeError::config_error(e.to_string()))?;

    let overrides = CliOverrides {
        root_path: args.root.clone(),
        strategy: args.strategy,
        thread_count: args.threads,
        content_mode: args.lazy.then_some(ContentMode::Lazy),
        encoding_mode: args.lossy.then_some(EncodingMode::Lossy),
        ignore_patterns: (!args.ignore.is_empty()).then(|| args.ignore.clone()),
        skip_hidden: args.skip_hidden.then_some(true),
        case_sensitive,
        word_boundary: boundary,
        log_level: cli.verbose.then(|| "debug".to_string()),
        ..CliOverrides::default()
    };

    let config = file_config.merge_with_cli(overrides);
    config.init_tracing();
    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

fn parse_boundary(value: &str) -> Result<WordBoundary> {
    match value.to_lowercase().as_str() {
        "trimmed" => Ok(WordBoundary::Trimmed),
        "whitespace" => Ok(WordBoundary::Whitespace),
        "unicode" => Ok(WordBoundary::Unicode),
        other => Err(TreeError::config_error(format!(
            "Unknown word boundary '{}' (expected trimmed, whitespace or unicode)",
            other
        ))),
    }
}

fn print_search_report(report: &SearchReport, stats_only: bool) {
    if !stats_only {
        for hit in &report.hits {
            println!(
                "{}: {}",
                hit.path.display().to_string().blue(),
                hit.occurrences.to_string().green()
            );
        }
    }

    println!(
        "Found {} matches of '{}' in {} of {} documents",
        report.total_matches,
        report.target.yellow(),
        report.documents_with_matches,
        report.documents_searched
    );
}

/// What one strategy produced, and how long it took
struct StrategyRun {
    strategy: Strategy,
    entries: u64,
    matches: Option<usize>,
    build_time: Duration,
    search_time: Duration,
}

fn run_strategy(config: &ScoutConfig, strategy: Strategy, word: Option<&str>) -> Result<StrategyRun> {
    let start = Instant::now();
    let root: Folder = build(&config.root_path, &config.build_options().with_strategy(strategy))?;
    let build_time = start.elapsed();

    let start = Instant::now();
    let matches = word
        .map(|word| {
            search_detailed(&root, word, &config.search_options().with_strategy(strategy))
                .map(|report| report.total_matches)
        })
        .transpose()?;
    let search_time = start.elapsed();

    Ok(StrategyRun {
        strategy,
        entries: count(&root),
        matches,
        build_time,
        search_time,
    })
}

fn compare_strategies(config: &ScoutConfig, word: Option<&str>) -> Result<()> {
    let runs = Strategy::ALL
        .iter()
        .map(|&strategy| run_strategy(config, strategy, word))
        .collect::<Result<Vec<_>>>()?;

    println!("{}", config.root_path.display().to_string().blue());
    for run in &runs {
        let matches = run
            .matches
            .map(|m| format!(", {} matches", m))
            .unwrap_or_default();
        println!(
            "  {:<10} {} entries{}  build {}  search {}",
            run.strategy.to_string(),
            run.entries,
            matches,
            humantime::format_duration(truncate_to_micros(run.build_time)),
            humantime::format_duration(truncate_to_micros(run.search_time))
        );
    }

    let first = &runs[0];
    let agree = runs
        .iter()
        .all(|run| run.entries == first.entries && run.matches == first.matches);
    if agree {
        println!("{}", "All strategies agree".green());
        Ok(())
    } else {
        println!("{}", "Strategies disagree".red());
        std::process::exit(1);
    }
}

fn truncate_to_micros(duration: Duration) -> Duration {
    Duration::from_micros(duration.as_micros() as u64)
}
