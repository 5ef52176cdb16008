use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::{TreeError, TreeResult};
use crate::executor::Strategy;
use crate::search::WordBoundary;
use crate::tree::EncodingMode;

/// Configuration for building and querying a tree.
///
/// # Configuration Locations
///
/// The configuration can be loaded from multiple locations in order of precedence:
/// 1. Custom config file specified via `--config` flag
/// 2. Local `.treescout.yaml` in the current directory
/// 3. Global `$HOME/.config/treescout/config.yaml`
///
/// # Configuration Format
///
/// ```yaml
/// # Root directory to build the tree from
/// root_path: "works"
///
/// # sequential | parallel | futures | reactive
/// strategy: parallel
///
/// # CPU workers (default: CPU cores) and blocking I/O workers (default: 2x CPU)
/// thread_count: 4
/// io_thread_count: 8
///
/// # eager: read documents while building, lazy: read on first access
/// content_mode: eager
///
/// # failfast | lossy
/// encoding_mode: failfast
///
/// # Entries to leave out of the tree (glob syntax)
/// ignore_patterns:
///   - "target"
///   - "**/*.tmp"
/// skip_hidden: true
///
/// # Search tokenisation: trimmed | whitespace | unicode
/// word_boundary: trimmed
/// case_sensitive: true
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
/// ```
///
/// Command-line arguments take precedence over file values, see
/// [`ScoutConfig::merge_with_cli`]. Nothing here is global state: the
/// values are turned into [`BuildOptions`] and [`SearchOptions`] and passed
/// explicitly to the builder and the search engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoutConfig {
    /// Root directory to build the tree from
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// Scheduling strategy for builds and searches
    #[serde(default)]
    pub strategy: Strategy,

    /// Number of CPU worker threads
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    /// Number of threads reserved for blocking filesystem calls
    #[serde(default = "default_io_thread_count")]
    pub io_thread_count: NonZeroUsize,

    /// When document text is read
    #[serde(default)]
    pub content_mode: ContentMode,

    /// How invalid UTF-8 in documents is handled
    #[serde(default)]
    pub encoding_mode: EncodingMode,

    /// Patterns of entries to leave out of the tree (glob syntax)
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Leave out entries whose name starts with a dot
    #[serde(default)]
    pub skip_hidden: bool,

    /// Whether search compares words case-sensitively
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,

    /// How document text is split into words for search
    #[serde(default)]
    pub word_boundary: WordBoundary,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// When a document's text is read from disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentMode {
    /// During the build; read failures abort the build
    #[default]
    Eager,
    /// On first access after the build
    Lazy,
}

/// Values given explicitly on the command line.
///
/// `None` leaves the configured value alone; `Some` always wins, even when it
/// equals the built-in default.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root_path: Option<PathBuf>,
    pub strategy: Option<Strategy>,
    pub thread_count: Option<NonZeroUsize>,
    pub io_thread_count: Option<NonZeroUsize>,
    pub content_mode: Option<ContentMode>,
    pub encoding_mode: Option<EncodingMode>,
    pub ignore_patterns: Option<Vec<String>>,
    pub skip_hidden: Option<bool>,
    pub case_sensitive: Option<bool>,
    pub word_boundary: Option<WordBoundary>,
    pub log_level: Option<String>,
}

/// Parameters of a single build
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub strategy: Strategy,
    pub thread_count: NonZeroUsize,
    pub io_thread_count: NonZeroUsize,
    pub content_mode: ContentMode,
    pub encoding_mode: EncodingMode,
    pub ignore_patterns: Vec<String>,
    pub skip_hidden: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            thread_count: default_thread_count(),
            io_thread_count: default_io_thread_count(),
            content_mode: ContentMode::default(),
            encoding_mode: EncodingMode::default(),
            ignore_patterns: Vec::new(),
            skip_hidden: false,
        }
    }
}

impl BuildOptions {
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Parameters of a search over a finished tree
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub strategy: Strategy,
    pub thread_count: NonZeroUsize,
    pub io_thread_count: NonZeroUsize,
    pub case_sensitive: bool,
    pub word_boundary: WordBoundary,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            thread_count: default_thread_count(),
            io_thread_count: default_io_thread_count(),
            case_sensitive: default_case_sensitive(),
            word_boundary: WordBoundary::default(),
        }
    }
}

impl SearchOptions {
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }
}

fn default_root_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_io_thread_count() -> NonZeroUsize {
    default_thread_count().saturating_mul(NonZeroUsize::new(2).unwrap_or(NonZeroUsize::MIN))
}

fn default_case_sensitive() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            strategy: Strategy::default(),
            thread_count: default_thread_count(),
            io_thread_count: default_io_thread_count(),
            content_mode: ContentMode::default(),
            encoding_mode: EncodingMode::default(),
            ignore_patterns: Vec::new(),
            skip_hidden: false,
            case_sensitive: default_case_sensitive(),
            word_boundary: WordBoundary::default(),
            log_level: default_log_level(),
        }
    }
}

impl ScoutConfig {
    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration from the default locations plus a specific file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("treescout/config.yaml")),
            // Local config
            Some(PathBuf::from(".treescout.yaml")),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicitly requested file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        }

        builder.build()?.try_deserialize()
    }

    /// Applies the values given on the command line over the file values
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if let Some(root_path) = cli.root_path {
            self.root_path = root_path;
        }
        if let Some(strategy) = cli.strategy {
            self.strategy = strategy;
        }
        if let Some(thread_count) = cli.thread_count {
            self.thread_count = thread_count;
        }
        if let Some(io_thread_count) = cli.io_thread_count {
            self.io_thread_count = io_thread_count;
        }
        if let Some(content_mode) = cli.content_mode {
            self.content_mode = content_mode;
        }
        if let Some(encoding_mode) = cli.encoding_mode {
            self.encoding_mode = encoding_mode;
        }
        if let Some(ignore_patterns) = cli.ignore_patterns {
            self.ignore_patterns = ignore_patterns;
        }
        if let Some(skip_hidden) = cli.skip_hidden {
            self.skip_hidden = skip_hidden;
        }
        if let Some(case_sensitive) = cli.case_sensitive {
            self.case_sensitive = case_sensitive;
        }
        if let Some(word_boundary) = cli.word_boundary {
            self.word_boundary = word_boundary;
        }
        if let Some(log_level) = cli.log_level {
            self.log_level = log_level;
        }
        self
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            strategy: self.strategy,
            thread_count: self.thread_count,
            io_thread_count: self.io_thread_count,
            content_mode: self.content_mode,
            encoding_mode: self.encoding_mode,
            ignore_patterns: self.ignore_patterns.clone(),
            skip_hidden: self.skip_hidden,
        }
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            strategy: self.strategy,
            thread_count: self.thread_count,
            io_thread_count: self.io_thread_count,
            case_sensitive: self.case_sensitive,
            word_boundary: self.word_boundary,
        }
    }

    /// Renders the effective configuration as YAML
    pub fn to_yaml(&self) -> TreeResult<String> {
        serde_yaml::to_string(self).map_err(|e| {
            TreeError::config_error(format!("Failed to serialize configuration to YAML: {}", e))
        })
    }

    /// Installs a `tracing` subscriber filtered by `RUST_LOG`, falling back to `log_level`
    pub fn init_tracing(&self) {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&self.log_level));
        // A subscriber may already be installed, e.g. by a test harness
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let config_content = r#"
            root_path: "works"
            strategy: reactive
            thread_count: 4
            io_thread_count: 6
            content_mode: lazy
            encoding_mode: lossy
            ignore_patterns: ["target"]
            skip_hidden: true
            case_sensitive: false
            word_boundary: unicode
            log_level: "debug"
        "#;

        let mut file = File::create(&config_path).unwrap();
        file.write_all(config_content.as_bytes()).unwrap();

        let config = ScoutConfig::load_from(Some(&config_path)).unwrap();
        assert_eq!(config.root_path, PathBuf::from("works"));
        assert_eq!(config.strategy, Strategy::Reactive);
        assert_eq!(config.thread_count, NonZeroUsize::new(4).unwrap());
        assert_eq!(config.io_thread_count, NonZeroUsize::new(6).unwrap());
        assert_eq!(config.content_mode, ContentMode::Lazy);
        assert_eq!(config.encoding_mode, EncodingMode::Lossy);
        assert_eq!(config.ignore_patterns, vec!["target".to_string()]);
        assert!(config.skip_hidden);
        assert!(!config.case_sensitive);
        assert_eq!(config.word_boundary, WordBoundary::Unicode);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_default_values() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let mut file = File::create(&config_path).unwrap();
        file.write_all(b"root_path: \".\"\n").unwrap();

        let config = ScoutConfig::load_from(Some(&config_path)).unwrap();
        assert_eq!(config.strategy, Strategy::Sequential);
        assert_eq!(
            config.thread_count,
            NonZeroUsize::new(num_cpus::get()).unwrap()
        );
        assert_eq!(config.content_mode, ContentMode::Eager);
        assert!(config.case_sensitive);
        assert_eq!(config.word_boundary, WordBoundary::Trimmed);
        assert!(config.ignore_patterns.is_empty());
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let mut file = File::create(&config_path).unwrap();
        file.write_all(b"thread_count: \"many\"\nstrategy: threads\n")
            .unwrap();

        assert!(ScoutConfig::load_from(Some(&config_path)).is_err());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ScoutConfig::load_from(Some(Path::new("nonexistent.yaml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_with_cli() {
        let file_config = ScoutConfig {
            root_path: PathBuf::from("works"),
            strategy: Strategy::Parallel,
            ignore_patterns: vec!["target".to_string()],
            log_level: "info".to_string(),
            ..ScoutConfig::default()
        };

        let cli = CliOverrides {
            strategy: Some(Strategy::Futures),
            case_sensitive: Some(false),
            ..CliOverrides::default()
        };

        let merged = file_config.merge_with_cli(cli);
        assert_eq!(merged.root_path, PathBuf::from("works")); // File value (not given)
        assert_eq!(merged.strategy, Strategy::Futures); // CLI value
        assert_eq!(merged.ignore_patterns, vec!["target".to_string()]); // File value
        assert!(!merged.case_sensitive); // CLI value
        assert_eq!(merged.log_level, "info"); // File value
    }

    #[test]
    fn test_cli_can_restore_default_values() {
        let file_config = ScoutConfig {
            strategy: Strategy::Parallel,
            case_sensitive: false,
            word_boundary: WordBoundary::Unicode,
            skip_hidden: true,
            ..ScoutConfig::default()
        };

        let cli = CliOverrides {
            strategy: Some(Strategy::Sequential),
            case_sensitive: Some(true),
            word_boundary: Some(WordBoundary::Trimmed),
            ..CliOverrides::default()
        };

        let merged = file_config.merge_with_cli(cli);
        assert_eq!(merged.strategy, Strategy::Sequential);
        assert!(merged.case_sensitive);
        assert_eq!(merged.word_boundary, WordBoundary::Trimmed);
        assert!(merged.skip_hidden); // File value
    }

    #[test]
    fn test_derived_options() {
        let config = ScoutConfig {
            strategy: Strategy::Reactive,
            content_mode: ContentMode::Lazy,
            case_sensitive: false,
            ..ScoutConfig::default()
        };

        let build = config.build_options();
        assert_eq!(build.strategy, Strategy::Reactive);
        assert_eq!(build.content_mode, ContentMode::Lazy);

        let search = config.search_options();
        assert_eq!(search.strategy, Strategy::Reactive);
        assert!(!search.case_sensitive);
    }

    #[test]
    fn test_to_yaml_contains_strategy() {
        let config = ScoutConfig {
            strategy: Strategy::Parallel,
            ..ScoutConfig::default()
        };
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("strategy: parallel"));
    }
}
