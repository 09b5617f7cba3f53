use rand::{SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;

/// Permutes the positions `0..len` of a shard catalog with the global seed.
///
/// Every worker computes this independently and must get the same answer, so the
/// result depends on nothing but `(len, seed)`.
pub fn global_order(len: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(&mut rng);
    order
}
