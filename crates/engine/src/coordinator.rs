//! Fan-out of independent per-player decisions.

use std::future::Future;

use futures::stream::{self, StreamExt, TryStreamExt};
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Run `op` once per item with at most `limit` in flight.
///
/// Fails fast: the first error drops every unit still running. A unit that
/// sees `cancel` fired before it starts produces nothing. Results come back
/// in completion order; callers that need a stable order sort them.
pub async fn run_parallel<I, T, F, Fut>(
    items: Vec<I>,
    cancel: &CancellationToken,
    limit: usize,
    op: F,
) -> Result<Vec<T>>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let op = &op;
    let results: Vec<Option<T>> = stream::iter(items.into_iter().map(|item| async move {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        op(item).await.map(Some)
    }))
    .buffer_unordered(limit.max(1))
    .try_collect()
    .await?;

    Ok(results.into_iter().flatten().collect())
}
