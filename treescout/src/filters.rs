/// Entry filtering applied while a directory is listed.
///
/// Filtered entries never reach classification, so they do not appear in the
/// tree and do not count towards any folder's size.
use glob::Pattern;
use std::path::Path;

use crate::errors::{TreeError, TreeResult};

/// Compiled ignore rules for one build
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    patterns: Vec<Pattern>,
    skip_hidden: bool,
}

impl EntryFilter {
    /// Compiles the glob patterns up front; an invalid pattern is a configuration error
    pub fn new(ignore_patterns: &[String], skip_hidden: bool) -> TreeResult<Self> {
        let patterns = ignore_patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| {
                    TreeError::config_error(format!("Invalid ignore pattern '{}': {}", p, e))
                })
            })
            .collect::<TreeResult<Vec<_>>>()?;

        Ok(Self {
            patterns,
            skip_hidden,
        })
    }

    /// Checks if an entry should be left out of the tree
    pub fn should_ignore(&self, path: &Path) -> bool {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.skip_hidden && is_hidden(&file_name) {
            return true;
        }

        let normalized_path = path.to_string_lossy().replace('\\', "/");
        self.patterns
            .iter()
            .any(|p| p.matches(&normalized_path) || p.matches(&file_name))
    }
}

fn is_hidden(file_name: &str) -> bool {
    file_name.starts_with('.') && file_name != "." && file_name != ".."
}
