use std::ops::Range;

/// Splits `total` ordered shards among `num_workers` and returns the positions owned
/// by `worker_id`.
///
/// Properties:
/// - Ranges are contiguous, disjoint and cover `[0..total)`.
/// - Every worker takes `ceil(total / num_workers)` shards in turn, so the trailing
///   workers may be short or empty.
pub fn partition_range(total: usize, worker_id: usize, num_workers: usize) -> Range<usize> {
    assert!(num_workers > 0);
    assert!(worker_id < num_workers);

    let per_worker = total.div_ceil(num_workers);
    let start = (worker_id * per_worker).min(total);
    let end = (start + per_worker).min(total);

    start..end
}
