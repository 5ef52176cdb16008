//! Reactive back-end: the children of a folder are emitted by a cold stream,
//! each one is processed on the runtime with bounded concurrency, and the
//! folder materialises when the stream completes. A failed child ends the
//! stream and aborts the stages still in flight.
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::trace;

use super::listing::{self, Child};
use super::BuildContext;
use crate::errors::TreeResult;
use crate::executor::AbortOnDrop;
use crate::tree::{Built, Folder};

pub(crate) fn build_folder(path: PathBuf, ctx: Arc<BuildContext>) -> BoxFuture<'static, TreeResult<Folder>> {
    Box::pin(assemble(path, ctx))
}

async fn assemble(path: PathBuf, ctx: Arc<BuildContext>) -> TreeResult<Folder> {
    ctx.cancel.check()?;
    let children = listing::list_blocking(path.clone(), Arc::clone(&ctx)).await?;

    let built: Vec<Built> = stream::iter(children)
        .map(|child| {
            let ctx = Arc::clone(&ctx);
            async move {
                let stage = AbortOnDrop::new(tokio::spawn(build_child(child, ctx)));
                listing::joined(stage.await)
            }
        })
        .buffer_unordered(ctx.concurrency)
        .try_collect()
        .await?;

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
