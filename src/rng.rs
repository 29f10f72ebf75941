//! Pseudo-randomness supplied to the engine.
//!
//! The engine never seeds itself. Board setup shuffles and the Deceive favor draw from a
//! [`RandomSource`] the caller hands in, so a match is reproducible from its seed.

// Index arithmetic on u64 draws is intentional
#![allow(clippy::cast_possible_truncation)]

/// Source of pseudo-random numbers.
pub trait RandomSource {
    /// Next raw 64-bit value.
    fn next_u64(&mut self) -> u64;

    /// Uniform-ish index in `[0, bound)`. Returns 0 when `bound` is 0.
    fn next_below(&mut self, bound: usize) -> usize {
        if bound == 0 {
            return 0;
        }
        (self.next_u64() % bound as u64) as usize
    }
}

/// Deterministic PRNG using xorshift64.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XorShift {
    state: u64,
}

impl XorShift {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        // Ensure non-zero state
        let state = if seed == 0 { 0x5555_5555_5555_5555 } else { seed };
        Self { state }
    }
}

impl RandomSource for XorShift {
    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

/// Fisher-Yates shuffle driven by `rng`.
pub fn shuffle<T, R: RandomSource + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.next_below(i + 1);
        items.swap(i, j);
    }
}
