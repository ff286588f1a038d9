//! Bounded, batch-sequential object fetching

use std::future::Future;

use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream};

use crate::config::DEFAULT_BATCH_SIZE;
use crate::error::Result;
use crate::traits::ObjectInfo;

/// Fetches objects in fixed-size batches
///
/// Batches run strictly one after another; a batch starts only after every
/// fetch of the previous one has completed and been visited. Inside a batch
/// up to `concurrency` fetches are in flight, and results are visited in
/// listed order regardless of completion order.
#[derive(Debug, Clone, Copy)]
pub struct BatchFetcher {
    batch_size: usize,
    concurrency: usize,
}

impl Default for BatchFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl BatchFetcher {
    pub fn new(batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            batch_size,
            concurrency: batch_size,
        }
    }

    /// Cap in-flight fetches per batch
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches needed for `count` objects
    pub fn batch_count(&self, count: usize) -> usize {
        count.div_ceil(self.batch_size)
    }

    /// Fetch every object, handing each result to `visit` in listed order
    ///
    /// The first failed fetch or visit aborts the run; fetches still in
    /// flight in that batch are dropped.
    pub async fn fetch_all<F, Fut, V>(
        &self,
        objects: &[ObjectInfo],
        mut fetch_one: F,
        mut visit: V,
    ) -> Result<()>
    where
        F: FnMut(&ObjectInfo) -> Fut,
        Fut: Future<Output = Result<Bytes>>,
        V: FnMut(&ObjectInfo, Bytes) -> Result<()>,
    {
        let total = self.batch_count(objects.len());

        for (index, batch) in objects.chunks(self.batch_size).enumerate() {
            tracing::debug!(
                batch = index + 1,
                of = total,
                objects = batch.len(),
                "Fetching batch"
            );

            let fetched: Vec<Bytes> = stream::iter(batch.iter().map(&mut fetch_one))
                .buffered(self.concurrency)
                .try_collect()
                .await?;

            for (object, data) in batch.iter().zip(fetched) {
                visit(object, data)?;
            }
        }

        Ok(())
    }
}
