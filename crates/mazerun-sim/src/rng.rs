//! Counter-based random numbers shared with the device kernel.
//!
//! Each draw hashes `(seed, counter)` and bumps the counter, so a world's
//! random stream is fully described by two `u32`s and can be resumed on
//! either backend. The mixing function is the `lowbias32` integer hash;
//! `kernel.wgsl` implements it bit for bit.

/// Seed used for every episode when the fixed-world flag is set.
pub const FIXED_WORLD_SEED: u32 = 0x5eed_0001;

/// `lowbias32` integer hash.
pub fn mix(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

/// Seed of the random stream for episode `episode_idx`.
pub fn episode_seed(episode_idx: u32) -> u32 {
    mix(episode_idx.wrapping_mul(0x9e37_79b9) ^ 0x5bd1_e995)
}

/// A resumable random stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rng {
    seed: u32,
    counter: u32,
}

impl Rng {
    /// A fresh stream.
    pub fn new(seed: u32) -> Self {
        Self::resume(seed, 0)
    }

    /// Continue a stream after `counter` draws.
    pub fn resume(seed: u32, counter: u32) -> Self {
        Self { seed, counter }
    }

    /// The stream's seed.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Draws taken so far.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Next raw 32-bit value.
    pub fn next_u32(&mut self) -> u32 {
        let v = mix(self.seed ^ mix(self.counter));
        self.counter = self.counter.wrapping_add(1);
        v
    }

    /// Uniform float in `[0, 1)` with 24 bits of precision.
    pub fn sample_uniform(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 * (1.0 / 16_777_216.0)
    }

    /// Uniform float in `[lo, hi)`.
    pub fn sample_range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.sample_uniform()
    }

    /// Uniform integer in `[lo, hi)`. `hi` must exceed `lo`.
    pub fn sample_i32(&mut self, lo: i32, hi: i32) -> i32 {
        debug_assert!(hi > lo);
        lo + (self.next_u32() % (hi - lo) as u32) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::Rng;
    use proptest::prelude::*;

    #[test]
    fn resume_continues_the_stream() {
        let mut a = Rng::new(42);
        a.next_u32();
        a.next_u32();
        let mut b = Rng::resume(42, 2);
        assert_eq!(a.next_u32(), b.next_u32());
        assert_eq!(a.counter(), 3);
    }

    #[test]
    fn seeds_differ_per_episode() {
        let seeds: Vec<_> = (0..64).map(episode_seed).collect();
        let mut unique = seeds.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), seeds.len());
    }

    #[test]
    fn known_values_are_stable() {
        // Pinned so the WGSL port can be checked against the same numbers.
        assert_eq!(mix(0), 0);
        assert_eq!(Rng::new(7).next_u32(), mix(7 ^ mix(0)));
    }

    proptest! {
        #[test]
        fn uniform_is_in_unit_interval(seed: u32, counter: u32) {
            let u = Rng::resume(seed, counter).sample_uniform();
            prop_assert!((0.0..1.0).contains(&u));
        }

        #[test]
        fn int_range_is_half_open(seed: u32, lo in -50i32..50, span in 1i32..20) {
            let v = Rng::new(seed).sample_i32(lo, lo + span);
            prop_assert!(v >= lo && v < lo + span);
        }
    }
}
