use std::num::NonZeroUsize;

use dataset::{DatasetErr, RatingsDataset, Record, ShardLoader, StreamMetrics, WorkerContext};
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

/// Order-sensitive digest of one pass, used to check that replays match.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassDigest {
    pub records: u64,
    pub checksum: u64,
}

impl PassDigest {
    #[inline]
    fn absorb(&mut self, record: &Record) {
        let word = record.user_idx.rotate_left(32) ^ record.item_idx ^ record.score.to_bits() as u64;
        self.checksum = (self.checksum.rotate_left(5) ^ word).wrapping_mul(0x0100_0000_01b3);
        self.records += 1;
    }
}

/// What one worker did before returning.
#[derive(Debug, Clone, Default)]
pub struct WorkerSummary {
    pub worker_id: usize,
    pub passes: Vec<PassDigest>,
    pub metrics: StreamMetrics,
    pub cancelled: bool,
}

/// Streams `epochs` passes over the shards owned by `ctx`.
///
/// Each pass is a fresh stream, so every epoch replays the same sequence. Stops early,
/// dropping the open stream, once `token` is cancelled.
///
/// # Returns
/// The first shard load error, which aborts the remaining epochs.
pub fn run_worker<L>(
    dataset: &RatingsDataset,
    ctx: Option<WorkerContext>,
    epochs: NonZeroUsize,
    loader: L,
    token: &CancellationToken,
) -> Result<WorkerSummary, DatasetErr>
where
    L: ShardLoader + Clone,
{
    let worker_id = ctx.map_or(0, |ctx| ctx.worker_id());
    let mut summary = WorkerSummary {
        worker_id,
        ..Default::default()
    };

    for epoch in 0..epochs.get() {
        let mut stream = dataset.stream(ctx, loader.clone());
        let mut digest = PassDigest::default();

        loop {
            if token.is_cancelled() {
                info!(worker_id = worker_id, epoch = epoch; "cancelled mid-pass");
                summary.metrics.merge(stream.metrics());
                summary.cancelled = true;
                return Ok(summary);
            }

            let Some(record) = stream.next() else {
                break;
            };
            digest.absorb(&record?);
        }

        let metrics = stream.metrics();
        debug!(
            worker_id = worker_id,
            epoch = epoch,
            records = digest.records,
            load_ms = metrics.load_time.as_millis() as u64;
            "epoch finished"
        );
        summary.metrics.merge(metrics);

        if summary.passes.first().is_some_and(|first| *first != digest) {
            warn!(worker_id = worker_id, epoch = epoch; "pass diverged from the first epoch");
        }
        summary.passes.push(digest);
    }

    Ok(summary)
}
