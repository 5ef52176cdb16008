use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinError;
use tracing::{debug, trace};

use super::BuildContext;
use crate::config::ContentMode;
use crate::errors::{TreeError, TreeResult};
use crate::tree::content;
use crate::tree::Document;

/// A classified, not yet built, child of a folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Child {
    Folder(PathBuf),
    Document(PathBuf),
}

/// Lists and classifies the direct children of `path`, leaving out ignored entries
pub(crate) fn list_children(path: &Path, ctx: &BuildContext) -> TreeResult<Vec<Child>> {
    ctx.cancel.check()?;
    let entries = fs::read_dir(path).map_err(|e| TreeError::from_io(path, e))?;

    let mut children = Vec::new();
    for entry in entries {
        let child_path = entry.map_err(|e| TreeError::from_io(path, e))?.path();
        if ctx.filter.should_ignore(&child_path) {
            trace!("Ignoring {}", child_path.display());
            continue;
        }
        children.push(classify(child_path)?);
    }

    ctx.metrics.record_listing(children.len());
    #[cfg(test)]
    if let Some(token) = &ctx.cancel_after_listing {
        token.cancel();
    }
    debug!("Listed {} ({} children)", path.display(), children.len());
    Ok(children)
}

/// Directories become folders and regular files documents, following symlinks.
/// Anything else, including a symlink whose target is gone, cannot be classified.
pub(crate) fn classify(path: PathBuf) -> TreeResult<Child> {
    match fs::metadata(&path) {
        Ok(meta) if meta.is_dir() => Ok(Child::Folder(path)),
        Ok(meta) if meta.is_file() => Ok(Child::Document(path)),
        Ok(_) => Err(TreeError::classification(path)),
        Err(e) if e.kind() == io::ErrorKind::NotFound && fs::symlink_metadata(&path).is_ok() => {
            Err(TreeError::classification(path))
        }
        Err(e) => Err(TreeError::from_io(&path, e)),
    }
}

/// Creates the document for `path`, reading its text now unless content is lazy
pub(crate) fn load_document(path: PathBuf, ctx: &BuildContext) -> TreeResult<Document> {
    ctx.cancel.check()?;
    let encoding_mode = ctx.options.encoding_mode;
    let document = match ctx.options.content_mode {
        ContentMode::Eager => {
            let (text, read_path) = content::read_text(&path, encoding_mode)?;
            ctx.metrics.record_read(text.len() as u64, read_path);
            Document::loaded(path, encoding_mode, text)
        }
        ContentMode::Lazy => Document::deferred(path, encoding_mode),
    };
    ctx.metrics.record_document();
    Ok(document)
}

/// [`list_children`] on the runtime's blocking pool
pub(crate) async fn list_blocking(path: PathBuf, ctx: Arc<BuildContext>) -> TreeResult<Vec<Child>> {
    joined(tokio::task::spawn_blocking(move || list_children(&path, &ctx)).await)
}

/// [`load_document`] on the runtime's blocking pool
pub(crate) async fn load_blocking(path: PathBuf, ctx: Arc<BuildContext>) -> TreeResult<Document> {
    joined(tokio::task::spawn_blocking(move || load_document(path, &ctx)).await)
}

/// Flattens the outcome of a joined task
pub(crate) fn joined<T>(result: Result<TreeResult<T>, JoinError>) -> TreeResult<T> {
    result.map_err(TreeError::from_join)?
}
