// Deterministic, portable pseudo-random number generator.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seeding.
// Every random decision made while composing a melody (repetition count,
// instrument, octave, starting key, template choice, per-note timing push)
// draws from one `PhraseRng` that the caller creates and passes in. There is
// no process-wide generator: two runs with the same seed and the same inputs
// produce the same melody, note for note.
//
// **Critical constraint: determinism.** Every method on `PhraseRng` must
// produce identical output given the same prior state, regardless of
// platform, compiler version, or optimization level. No floating point in the
// core generator, no stdlib hashing, no OS entropy in this crate. Callers that
// want an unpredictable melody pick the seed themselves.

use serde::{Deserialize, Serialize};

/// Xoshiro256++ PRNG, the sole source of randomness for melody generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseRng {
    s: [u64; 4],
}

impl PhraseRng {
    /// Create a new PRNG seeded from a `u64`.
    ///
    /// Uses SplitMix64 to expand the seed into the 256-bit internal state.
    /// Two `PhraseRng` instances created with the same seed will produce
    /// identical output sequences.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Generate a uniform random integer in `[low, high)`.
    ///
    /// Uses rejection sampling to avoid modulo bias.
    /// Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let range = high - low;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1));
        }
        let threshold = range.wrapping_neg() % range; // = (2^64 - range) % range
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range);
            }
        }
    }

    /// Generate a uniform random `usize` in `[low, high)`.
    ///
    /// Panics if `low >= high`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }

    /// Generate a uniform random `usize` in `[low, high]` (inclusive on both ends).
    ///
    /// Panics if `low > high`.
    pub fn range_usize_inclusive(&mut self, low: usize, high: usize) -> usize {
        assert!(low <= high, "range_usize_inclusive: low must be <= high");
        self.range_u64(low as u64, high as u64 + 1) as usize
    }

    /// Generate a uniform random `u8` in `[low, high]` (inclusive on both ends).
    ///
    /// Panics if `low > high`.
    pub fn range_u8_inclusive(&mut self, low: u8, high: u8) -> u8 {
        assert!(low <= high, "range_u8_inclusive: low must be <= high");
        self.range_u64(low as u64, high as u64 + 1) as u8
    }

    /// Pick one element of `items` uniformly. Returns `None` for an empty slice
    /// without consuming any randomness.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        Some(&items[self.range_usize(0, items.len())])
    }
}

/// SplitMix64, used only for seeding xoshiro256++ from a single `u64`.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn determinism_same_seed_same_output() {
        let mut a = PhraseRng::new(42);
        let mut b = PhraseRng::new(42);
        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_different_output() {
        let mut a = PhraseRng::new(42);
        let mut b = PhraseRng::new(43);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn splitmix_reference_values() {
        // Published SplitMix64 outputs for seed 0.
        let mut state = 0u64;
        assert_eq!(splitmix64(&mut state), 0xe220_a839_7b1d_cdaf);
        assert_eq!(splitmix64(&mut state), 0x6e78_9e6a_a1b9_65f4);
    }

    #[test]
    fn range_u64_within_bounds() {
        let mut rng = PhraseRng::new(999);
        for _ in 0..10_000 {
            let v = rng.range_u64(10, 20);
            assert!((10..20).contains(&v), "range_u64 out of range: {v}");
        }
    }

    #[test]
    fn range_usize_inclusive_reaches_both_ends() {
        let mut rng = PhraseRng::new(666);
        let mut seen = [false; 11];
        for _ in 0..10_000 {
            let v = rng.range_usize_inclusive(5, 15);
            assert!((5..=15).contains(&v), "range_usize_inclusive out of range: {v}");
            seen[v - 5] = true;
        }
        assert!(seen.iter().all(|&s| s), "every value in 5..=15 should appear");
    }

    #[test]
    fn range_u8_inclusive_within_bounds() {
        let mut rng = PhraseRng::new(888);
        let mut saw_max = false;
        for _ in 0..10_000 {
            let v = rng.range_u8_inclusive(0, 104);
            assert!(v <= 104, "range_u8_inclusive out of range: {v}");
            saw_max |= v == 104;
        }
        assert!(saw_max, "range_u8_inclusive should reach the upper bound");
    }

    #[test]
    fn range_three_outcomes_roughly_uniform() {
        let mut rng = PhraseRng::new(7);
        let mut counts = [0u32; 3];
        let n = 30_000;
        for _ in 0..n {
            counts[rng.range_usize(0, 3)] += 1;
        }
        for (outcome, &c) in counts.iter().enumerate() {
            let pct = c as f64 / n as f64;
            assert!(
                (0.30..0.37).contains(&pct),
                "outcome {outcome} should be ~33%, got {:.1}%",
                pct * 100.0
            );
        }
    }

    #[test]
    fn choose_empty_is_none_and_consumes_nothing() {
        let mut rng = PhraseRng::new(5);
        let before = rng.clone();
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());
        assert_eq!(rng, before);
    }

    #[test]
    fn choose_returns_member() {
        let mut rng = PhraseRng::new(5);
        let items = ["sad", "energetic", "creepy"];
        for _ in 0..100 {
            let picked = rng.choose(&items).unwrap();
            assert!(items.contains(picked));
        }
    }

    #[test]
    fn serialization_roundtrip() {
        let mut rng = PhraseRng::new(42);
        for _ in 0..100 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: PhraseRng = serde_json::from_str(&json).unwrap();
        for _ in 0..100 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }
}
