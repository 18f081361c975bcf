//! Fixed-width batched concurrency.
//!
//! Work items are split into batches of `width`. Items inside a batch run
//! concurrently; batches run one after another. This bounds the number of
//! open file handles while still overlapping I/O latency.
//!
//! Results come back in input order, regardless of completion order.
//!
//! # Example
//!
//! ```
//! use toolbench::parallel::BatchExecutor;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let executor = BatchExecutor::new(3);
//! let doubled = executor.run((1..=7).collect(), |n: u32| async move { n * 2 }).await;
//! assert_eq!(doubled, vec![2, 4, 6, 8, 10, 12, 14]);
//! # });
//! ```

use std::future::Future;

use futures::future::join_all;
use tracing::debug;

/// Default batch width used by the stat batcher and the aggregation engine.
pub const DEFAULT_BATCH_WIDTH: usize = 10;

/// Runs work in fixed-width concurrent batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchExecutor {
    width: usize,
}

impl Default for BatchExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_WIDTH)
    }
}

impl BatchExecutor {
    /// Creates an executor. A width of 0 is treated as 1.
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
        }
    }

    /// Returns the batch width.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Applies `f` to every item, `width` at a time, and returns the results
    /// in input order.
    pub async fn run<I, T, F, Fut>(&self, items: Vec<I>, f: F) -> Vec<T>
    where
        F: Fn(I) -> Fut,
        Fut: Future<Output = T>,
    {
        let total = items.len();
        let mut results = Vec::with_capacity(total);
        let mut remaining = items.into_iter();
        let mut batch_index = 0usize;

        loop {
            let batch: Vec<I> = remaining.by_ref().take(self.width).collect();
            if batch.is_empty() {
                break;
            }
            debug!(batch = batch_index, size = batch.len(), total, "Running batch");
            results.extend(join_all(batch.into_iter().map(&f)).await);
            batch_index += 1;
        }

        results
    }
}
