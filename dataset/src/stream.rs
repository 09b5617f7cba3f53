use std::{iter::FusedIterator, path::PathBuf, time::Instant, vec};

use log::{debug, info, warn};

use crate::{
    catalog::ShardCatalog,
    config::WorkerContext,
    error::ShardLoadErr,
    loader::ShardLoader,
    metrics::StreamMetrics,
    record::{Record, Shard},
    shuffle::LocalShuffler,
};

/// A fixed catalog of rating shards plus the seed that orders it.
///
/// Every call to [`RatingsDataset::stream`] opens a fresh pass; passes opened with the
/// same worker context yield the same records in the same order.
#[derive(Debug, Clone)]
pub struct RatingsDataset {
    catalog: ShardCatalog,
    seed: u64,
}

impl RatingsDataset {
    pub fn new(catalog: ShardCatalog, seed: u64) -> Self {
        Self { catalog, seed }
    }

    #[inline]
    pub fn catalog(&self) -> &ShardCatalog {
        &self.catalog
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The shards a worker owns, in visiting order, each paired with its position in
    /// the global order.
    ///
    /// # Args
    /// * `ctx` - The worker's identity, `None` in single-process mode.
    pub fn assignment(&self, ctx: Option<WorkerContext>) -> Vec<(usize, PathBuf)> {
        let ordered = self.catalog.ordered(self.seed);
        let range = match ctx {
            Some(ctx) => ctx.range(ordered.len()),
            None => 0..ordered.len(),
        };

        ordered[range]
            .iter()
            .map(|&(position, path)| (position, path.to_path_buf()))
            .collect()
    }

    /// Opens a new pass over the shards owned by `ctx`.
    ///
    /// Nothing is loaded until the first record is requested.
    pub fn stream<L: ShardLoader>(&self, ctx: Option<WorkerContext>, loader: L) -> ShardStream<L> {
        let worker_id = ctx.map_or(0, |ctx| ctx.worker_id());

        ShardStream {
            loader,
            assigned: self.assignment(ctx),
            shuffler: LocalShuffler::new(self.seed, worker_id),
            worker_id,
            next_shard: 0,
            current: None,
            state: StreamState::NotStarted,
            metrics: StreamMetrics::default(),
        }
    }
}

/// Where a [`ShardStream`] is in its pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    NotStarted,
    SelectingShard,
    LoadingShard,
    EmittingRecords,
    Exhausted,
    Failed,
}

/// A loaded shard and the order its records are emitted in.
#[derive(Debug)]
struct Visit {
    shard: Shard,
    order: vec::IntoIter<usize>,
}

/// One worker's pass over its shards.
///
/// Yields every record of every assigned shard, shard by shard, each shard in its own
/// seeded order. A shard that fails to load ends the pass: the error is yielded once
/// and the stream returns `None` from then on.
///
/// At most one shard is held in memory. Dropping the stream mid-pass releases it and
/// leaves the remaining shards untouched.
#[derive(Debug)]
pub struct ShardStream<L> {
    loader: L,
    assigned: Vec<(usize, PathBuf)>,
    shuffler: LocalShuffler,
    worker_id: usize,
    next_shard: usize,
    current: Option<Visit>,
    state: StreamState,
    metrics: StreamMetrics,
}

impl<L> ShardStream<L> {
    #[inline]
    pub fn state(&self) -> StreamState {
        self.state
    }

    #[inline]
    pub fn metrics(&self) -> &StreamMetrics {
        &self.metrics
    }

    #[inline]
    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    /// The shards this pass visits, in order.
    pub fn assigned(&self) -> impl Iterator<Item = &PathBuf> {
        self.assigned.iter().map(|(_, path)| path)
    }
}

impl<L: ShardLoader> ShardStream<L> {
    fn load_next(&mut self) -> Result<(), ShardLoadErr> {
        let (position, path) = &self.assigned[self.next_shard];
        self.next_shard += 1;

        let started = Instant::now();
        let shard = self.loader.load(path)?;
        self.metrics.add_load(started.elapsed());

        debug!(
            worker_id = self.worker_id,
            position = *position,
            records = shard.len();
            "visiting shard {}",
            path.display()
        );

        let order = self.shuffler.permutation(*position, shard.len()).into_iter();
        self.current = Some(Visit { shard, order });
        Ok(())
    }
}

impl<L: ShardLoader> Iterator for ShardStream<L> {
    type Item = Result<Record, ShardLoadErr>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                StreamState::Exhausted | StreamState::Failed => return None,
                StreamState::NotStarted => {
                    info!(
                        worker_id = self.worker_id,
                        shards = self.assigned.len();
                        "starting pass"
                    );
                    self.state = StreamState::SelectingShard;
                }
                StreamState::SelectingShard => {
                    if self.next_shard < self.assigned.len() {
                        self.state = StreamState::LoadingShard;
                    } else {
                        info!(
                            worker_id = self.worker_id,
                            shards = self.metrics.shards_loaded,
                            records = self.metrics.records_emitted;
                            "pass finished"
                        );
                        self.state = StreamState::Exhausted;
                    }
                }
                StreamState::LoadingShard => match self.load_next() {
                    Ok(()) => self.state = StreamState::EmittingRecords,
                    Err(e) => {
                        warn!(worker_id = self.worker_id; "aborting pass: {e}");
                        self.state = StreamState::Failed;
                        return Some(Err(e));
                    }
                },
                StreamState::EmittingRecords => {
                    let next = self
                        .current
                        .as_mut()
                        .and_then(|visit| visit.order.next().map(|idx| visit.shard.record(idx)));

                    match next {
                        Some(record) => {
                            self.metrics.bump_records();
                            return Some(Ok(record));
                        }
                        None => {
                            self.current = None;
                            self.state = StreamState::SelectingShard;
                        }
                    }
                }
            }
        }
    }
}

impl<L: ShardLoader> FusedIterator for ShardStream<L> {}
