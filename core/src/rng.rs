//! Random Number Generator.

use crate::base::*;
use hexf::hexf32;

/// 32-bit precision value for 1 - epsilon.
pub const ONE_MINUS_EPSILON: Float = hexf32!("0x1.fffffep-1");

const PCG32_DEFAULT_STATE: u64 = 0x853c49e6748fea9b;
const PCG32_DEFAULT_STREAM: u64 = 0xda3e39cb94b95bdb;
const PCG32_MULT: u64 = 0x5851f42d4c957f2d;

/// Finalizer of the SplitMix64 generator, used to decorrelate seed inputs.
///
/// * `z` - The value to mix.
#[inline(always)]
fn split_mix_64(z: u64) -> u64 {
    let z = z.wrapping_add(0x9e3779b97f4a7c15);
    let z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    let z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// PCG32 pseudo-random number generator with hash-based seeding so that
/// every (stream, sequence) pair yields an uncorrelated, reproducible
/// sequence regardless of scheduling.
#[derive(Clone)]
pub struct Rng {
    state: u64,
    inc: u64,
}

impl Default for Rng {
    /// Return a new instance of `Rng` with default state and stream.
    fn default() -> Self {
        Self {
            state: PCG32_DEFAULT_STATE,
            inc: PCG32_DEFAULT_STREAM,
        }
    }
}

impl Rng {
    /// Create a new `Rng` seeded from a starting sequence.
    ///
    /// * `sequence_index` - The starting sequence to seed with.
    pub fn new(sequence_index: u64) -> Self {
        let mut ret = Self { state: 0, inc: 0 };
        ret.seed(sequence_index, PCG32_DEFAULT_STATE);
        ret
    }

    /// Create a new `Rng` by hashing a base seed, a stream identifier and a
    /// sequence index. Distinct streams (e.g. camera vs. light paths) are
    /// uncorrelated.
    ///
    /// * `base_seed` - The base seed shared by a render.
    /// * `stream`    - Stream identifier.
    /// * `sequence`  - Sequence index within the stream (e.g. pixel or path
    ///                 index combined with the iteration).
    pub fn from_hash(base_seed: u64, stream: u64, sequence: u64) -> Self {
        let h1 = split_mix_64(base_seed ^ split_mix_64(stream));
        let h2 = split_mix_64(h1 ^ split_mix_64(sequence));
        let mut ret = Self { state: 0, inc: 0 };
        ret.seed(h1, h2);
        ret
    }

    /// Initialize the generator state from a sequence selector and a state
    /// seed.
    ///
    /// * `init_seq`   - Selects the output sequence.
    /// * `init_state` - Starting state.
    #[inline(always)]
    fn seed(&mut self, init_seq: u64, init_state: u64) {
        self.state = 0;
        self.inc = (init_seq << 1) | 1;
        let _ = self.uniform_u32();
        self.state = self.state.wrapping_add(init_state);
        let _ = self.uniform_u32();
    }

    /// Returns a uniformly distributed u32 value.
    #[inline(always)]
    pub fn uniform_u32(&mut self) -> u32 {
        let old_state = self.state;
        self.state = old_state.wrapping_mul(PCG32_MULT).wrapping_add(self.inc);

        let xor_shifted = (((old_state >> 18) ^ old_state) >> 27) as u32;
        let rot = (old_state >> 59) as u32;
        xor_shifted.rotate_right(rot)
    }

    /// Returns a uniformly distributed value over the half open interval
    /// [0.0, 1.0).
    pub fn next_float(&mut self) -> Float {
        min(
            self.uniform_u32() as Float * hexf32!("0x1.0p-32"),
            ONE_MINUS_EPSILON,
        )
    }

    /// Returns two independent uniform values in [0.0, 1.0).
    pub fn next_float_2d(&mut self) -> (Float, Float) {
        (self.next_float(), self.next_float())
    }

    /// Returns three independent uniform values in [0.0, 1.0).
    pub fn next_float_3d(&mut self) -> (Float, Float, Float) {
        (self.next_float(), self.next_float(), self.next_float())
    }

    /// Returns a uniformly distributed integer over [lo, hi).
    ///
    /// * `lo` - Inclusive lower bound.
    /// * `hi` - Exclusive upper bound.
    pub fn next_int(&mut self, lo: u32, hi: u32) -> u32 {
        debug_assert!(hi > lo);
        let b = hi - lo;
        let threshold = b.wrapping_neg() % b;
        loop {
            let r = self.uniform_u32();
            if r >= threshold {
                return lo + r % b;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_float_in_range() {
        let mut rng = Rng::new(7);
        for _ in 0..10_000 {
            let f = rng.next_float();
            assert!((0.0..1.0).contains(&f));
        }
    }

    #[test]
    fn hash_seeding_is_deterministic() {
        let mut a = Rng::from_hash(42, 1, 13);
        let mut b = Rng::from_hash(42, 1, 13);
        for _ in 0..100 {
            assert_eq!(a.uniform_u32(), b.uniform_u32());
        }
    }

    #[test]
    fn streams_differ() {
        let mut a = Rng::from_hash(42, 1, 13);
        let mut b = Rng::from_hash(42, 2, 13);
        let matches = (0..64)
            .filter(|_| a.uniform_u32() == b.uniform_u32())
            .count();
        assert!(matches < 4);
    }

    #[test]
    fn next_int_bounds() {
        let mut rng = Rng::new(3);
        let mut seen = [false; 7];
        for _ in 0..1000 {
            let v = rng.next_int(2, 9) as usize;
            assert!((2..9).contains(&v));
            seen[v - 2] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
