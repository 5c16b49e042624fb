//! Seeded shuffling whose output is fixed forever for a given seed and input.
//!
//! `rand`'s own `SliceRandom::shuffle` and `gen_range` are free to change their algorithm
//! between releases, so the permutation is pinned here instead: a SplitMix64 generator
//! (`rand_xoshiro`) feeding a Fisher-Yates shuffle with unbiased rejection sampling. Any
//! reimplementation following these steps reproduces the exact same train/val membership.

use rand::{RngCore, SeedableRng};
use rand_xoshiro::SplitMix64;

/// Identifies the shuffle below. Bump it if any step ever changes.
pub const SHUFFLE_ALGORITHM: &str = "splitmix64-fisher-yates-v1";

/// Uniform value in `[0, bound)` by rejecting draws below `2^64 mod bound`. `bound` is never 0.
fn next_bounded<R: RngCore>(rng: &mut R, bound: u64) -> u64 {
    let threshold = bound.wrapping_neg() % bound;
    loop {
        let r = rng.next_u64();
        if r >= threshold {
            return r % bound;
        }
    }
}

/// In-place Fisher-Yates: for `i` from the last index down to 1, swap `i` with a uniform
/// `j` in `[0, i]`.
pub fn fisher_yates<T, R: RngCore>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = next_bounded(rng, i as u64 + 1) as usize;
        items.swap(i, j);
    }
}

/// Shuffles `items` with a fresh SplitMix64 whose initial state is `seed`.
pub fn seeded_shuffle<T>(items: &mut [T], seed: u64) {
    let mut rng = SplitMix64::seed_from_u64(seed);
    fisher_yates(items, &mut rng);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splitmix64_reference_output() {
        let mut rng = SplitMix64::seed_from_u64(0);
        assert_eq!(rng.next_u64(), 0xe220_a839_7b1d_cdaf);
        assert_eq!(rng.next_u64(), 0x6e78_9e6a_a1b9_65f4);
        assert_eq!(rng.next_u64(), 0x06c4_5d18_8009_454f);

        let mut rng = SplitMix64::seed_from_u64(123);
        assert_eq!(rng.next_u64(), 13_032_462_758_197_477_675);
        assert_eq!(rng.next_u64(), 18_015_028_434_894_305_148);
    }

    #[test]
    fn bounded_draws_stay_in_range() {
        let mut rng = SplitMix64::seed_from_u64(5);
        for bound in 1..50u64 {
            assert!(next_bounded(&mut rng, bound) < bound);
        }
        assert_eq!(next_bounded(&mut rng, 1), 0);
    }

    #[test]
    fn shuffle_reference_vectors() {
        let mut ids = [1, 2, 3, 4, 5];
        seeded_shuffle(&mut ids, 123);
        assert_eq!(ids, [4, 3, 2, 5, 1]);

        let mut ids = [1, 2, 3, 4, 5];
        seeded_shuffle(&mut ids, 0);
        assert_eq!(ids, [3, 4, 2, 5, 1]);

        let mut ids: Vec<u32> = (0..10).collect();
        seeded_shuffle(&mut ids, 42);
        assert_eq!(ids, vec![0, 9, 5, 8, 6, 4, 7, 2, 1, 3]);
    }

    #[test]
    fn fisher_yates_matches_seeded_shuffle() {
        let mut a: Vec<i64> = (0..30).collect();
        let mut b = a.clone();
        seeded_shuffle(&mut a, 99);
        fisher_yates(&mut b, &mut SplitMix64::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn shuffle_keeps_all_elements() {
        let elements: Vec<i64> = (0..100).collect();
        let mut shuffled = elements.clone();
        seeded_shuffle(&mut shuffled, 7);
        assert_ne!(shuffled, elements);
        shuffled.sort_unstable();
        assert_eq!(shuffled, elements);
    }

    #[test]
    fn shuffle_of_tiny_slices_is_noop() {
        let mut empty: [u8; 0] = [];
        seeded_shuffle(&mut empty, 1);
        let mut one = [9];
        seeded_shuffle(&mut one, 1);
        assert_eq!(one, [9]);
    }
}
