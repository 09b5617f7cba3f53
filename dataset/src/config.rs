use std::{num::NonZeroUsize, ops::Range};

use crate::{error::ConfigErr, partition::partition_range};

/// Identity of one worker among a fixed set of parallel workers.
///
/// Supplied by the host that spawns the workers; a stream opened without one runs in
/// single-process mode and owns the whole catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerContext {
    worker_id: usize,
    num_workers: NonZeroUsize,
}

impl WorkerContext {
    /// Creates a new worker context.
    ///
    /// # Args
    /// * `worker_id` - Index of this worker, in `[0, num_workers)`.
    /// * `num_workers` - Total amount of workers sharing the catalog.
    ///
    /// # Returns
    /// A `ConfigErr` if there are no workers or the id is out of range.
    pub fn new(worker_id: usize, num_workers: usize) -> Result<Self, ConfigErr> {
        let num_workers = NonZeroUsize::new(num_workers).ok_or(ConfigErr::ZeroWorkers)?;

        if worker_id >= num_workers.get() {
            return Err(ConfigErr::WorkerIdOutOfRange {
                worker_id,
                num_workers: num_workers.get(),
            });
        }

        Ok(Self {
            worker_id,
            num_workers,
        })
    }

    #[inline]
    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    #[inline]
    pub fn num_workers(&self) -> usize {
        self.num_workers.get()
    }

    /// The positions of a `total`-long ordered catalog owned by this worker.
    #[inline]
    pub fn range(self, total: usize) -> Range<usize> {
        partition_range(total, self.worker_id, self.num_workers.get())
    }
}
