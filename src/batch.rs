//! Applies a mutation to a list of usernames in bounded chunks.
//!
//! Chunks run one after another. The first failing chunk stops the run;
//! chunks already applied stay applied, so a failed run may have added
//! some users. Re-running is safe because the next diff skips them.

use std::future::Future;

use tracing::{error, info};

use crate::error::SyncError;

/// Split `items` into contiguous chunks of at most `size`, preserving order.
pub fn chunk<T>(items: &[T], size: usize) -> Vec<&[T]> {
    items.chunks(size.max(1)).collect()
}

/// Run `mutate` once per chunk, in order, waiting for each before the next.
///
/// Returns the number of chunks applied. A failing chunk is reported as
/// [`SyncError::Batch`] and no later chunk is dispatched.
pub async fn apply_in_batches<F, Fut>(
    identifiers: &[String],
    batch_size: usize,
    mut mutate: F,
) -> Result<usize, SyncError>
where
    F: FnMut(Vec<String>) -> Fut,
    Fut: Future<Output = Result<(), SyncError>>,
{
    let chunks = chunk(identifiers, batch_size);
    let total = chunks.len();

    for (i, batch) in chunks.into_iter().enumerate() {
        let index = i + 1;
        info!(batch = index, total, size = batch.len(), "applying batch");
        if let Err(err) = mutate(batch.to_vec()).await {
            error!(batch = index, total, %err, "batch failed; remaining batches skipped");
            return Err(SyncError::Batch {
                index,
                total,
                source: Box::new(err),
            });
        }
    }

    Ok(total)
}
