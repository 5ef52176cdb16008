/// Error types for building and querying directory trees.
///
/// Every fallible operation in the crate returns [`TreeResult`]. Failures are
/// never skipped: the first error raised anywhere in a build or a search
/// aborts the whole call and reaches the caller unchanged, so a caller either
/// receives a complete tree or an error, never a partial tree.
///
/// ```rust,ignore
/// match treescout::build(root, &options) {
///     Ok(folder) => println!("{} entries", folder.size()),
///     Err(TreeError::NotFound(path)) => eprintln!("missing: {}", path.display()),
///     Err(TreeError::Cancelled) => eprintln!("build cancelled"),
///     Err(e) => eprintln!("{e}"),
/// }
/// ```
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for tree operations
pub type TreeResult<T> = Result<T, TreeError>;

/// Errors that can occur while building, traversing or searching a tree
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Path not found: {0}")]
    NotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("IO error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Entry is neither a readable directory nor a readable file: {0}")]
    Classification(PathBuf),
    #[error("Operation cancelled")]
    Cancelled,
    #[error("Invalid UTF-8 in document {path}: {source}")]
    Encoding {
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Worker pool error: {0}")]
    Pool(String),
}

impl TreeError {
    /// Maps an I/O failure on `path` to the matching variant
    pub fn from_io(path: impl AsRef<Path>, err: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source: err },
        }
    }

    pub fn classification(path: impl Into<PathBuf>) -> Self {
        Self::Classification(path.into())
    }

    pub fn encoding(path: impl Into<PathBuf>, source: std::string::FromUtf8Error) -> Self {
        Self::Encoding {
            path: path.into(),
            source,
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn pool_error(msg: impl Into<String>) -> Self {
        Self::Pool(msg.into())
    }

    /// Converts a failed tokio join into a pool error, keeping cancellation distinct
    pub(crate) fn from_join(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            Self::Cancelled
        } else {
            Self::Pool(format!("worker task panicked: {}", err))
        }
    }

    /// True for the I/O family: missing paths, permission failures and raw I/O errors
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::PermissionDenied(_) | Self::Io { .. }
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_maps_kinds() {
        let err = TreeError::from_io("a.txt", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, TreeError::NotFound(_)));

        let err = TreeError::from_io("a.txt", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, TreeError::PermissionDenied(_)));

        let err = TreeError::from_io("a.txt", io::Error::new(io::ErrorKind::Other, "disk on fire"));
        assert!(matches!(err, TreeError::Io { .. }));
        assert!(err.is_io());
    }

    #[test]
    fn test_error_messages() {
        let err = TreeError::from_io("missing", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.to_string(), "Path not found: missing");

        let err = TreeError::classification("dangling");
        assert_eq!(
            err.to_string(),
            "Entry is neither a readable directory nor a readable file: dangling"
        );
        assert!(!err.is_io());

        let err = TreeError::config_error("bad strategy");
        assert_eq!(err.to_string(), "Configuration error: bad strategy");

        assert_eq!(TreeError::Cancelled.to_string(), "Operation cancelled");
        assert!(TreeError::Cancelled.is_cancelled());
    }
}
