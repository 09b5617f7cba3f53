use rand::{SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;

use crate::seed;

/// Per-worker shuffler of record indices within a shard.
///
/// Each shard visit gets a generator of its own, seeded from the worker's local seed
/// and the shard's position in the global order. No state carries over from one shard
/// to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalShuffler {
    local_seed: u64,
}

impl LocalShuffler {
    /// Creates a new `LocalShuffler`.
    ///
    /// # Arguments
    /// * `seed` - The global seed.
    /// * `worker_id` - The worker this shuffler belongs to, `0` in single-process mode.
    pub fn new(seed: u64, worker_id: usize) -> Self {
        Self {
            local_seed: seed::local_seed(seed, worker_id),
        }
    }

    #[inline]
    pub fn local_seed(&self) -> u64 {
        self.local_seed
    }

    /// Returns a permutation of `0..n` for the shard at `position` in the global order.
    pub fn permutation(&self, position: usize, n: usize) -> Vec<usize> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed::shard_seed(self.local_seed, position));
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut rng);
        indices
    }
}
