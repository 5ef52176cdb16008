//! Future-composed back-end: every child is its own tokio task and a folder
//! resolves once all of its child tasks have.
use futures::future::BoxFuture;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::trace;

use super::listing::{self, Child};
use super::BuildContext;
use crate::errors::{TreeError, TreeResult};
use crate::tree::{Built, Folder};

pub(crate) fn build_folder(path: PathBuf, ctx: Arc<BuildContext>) -> BoxFuture<'static, TreeResult<Folder>> {
    Box::pin(assemble(path, ctx))
}

async fn assemble(path: PathBuf, ctx: Arc<BuildContext>) -> TreeResult<Folder> {
    ctx.cancel.check()?;
    let children = listing::list_blocking(path.clone(), Arc::clone(&ctx)).await?;

    let mut tasks = JoinSet::new();
    for child in children {
        tasks.spawn(build_child(child, Arc::clone(&ctx)));
    }

    // Returning early drops the set, which aborts the remaining siblings
    let mut built = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        built.push(joined.map_err(TreeError::from_join)??);
    }

    let folder = Folder::from_built(path, built);
    trace!("Built {} ({} entries)", folder.path().display(), folder.size());
    Ok(folder)
}

async fn build_child(child: Child, ctx: Arc<BuildContext>) -> TreeResult<Built> {
    match child {
        Child::Folder(path) => build_folder(path, ctx).await.map(Built::Folder),
        Child::Document(path) => listing::load_blocking(path, ctx).await.map(Built::Document),
    }
}
