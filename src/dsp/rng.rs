//! Uniform Random Deviates
//!
//! 32-bit linear congruential generator (Knuth/Lewis "even quicker"
//! constants) with the float-mantissa trick: the low 23 bits of the state
//! become the mantissa of a float in [1, 2).

use crate::config::DEFAULT_SEED;

/// LCG multiplier
pub const LCG_MULTIPLIER: u32 = 1_664_525;

/// LCG increment
pub const LCG_INCREMENT: u32 = 1_013_904_223;

/// IEEE-754 binary32 bit pattern of 1.0
pub const FLOAT_ONE_BITS: u32 = 0x3F80_0000;

/// Mantissa field of an IEEE-754 binary32
pub const MANTISSA_MASK: u32 = 0x007F_FFFF;

/// Reinterpret the low 23 bits of `word` as the mantissa of a float in [1, 2)
///
/// `f32::from_bits` is defined as a binary32 reinterpretation on every
/// target, so sequences are bit-identical across platforms.
#[must_use]
pub fn unit_float_from_bits(word: u32) -> f32 {
    f32::from_bits(FLOAT_ONE_BITS | (word & MANTISSA_MASK))
}

/// Linear congruential generator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lcg32 {
    state: u32,
}

impl Lcg32 {
    /// Create a generator from a seed
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Advance and return the raw 32-bit state
    pub fn next_word(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT);
        self.state
    }

    /// Next uniform deviate in [0, 1)
    pub fn next_uniform(&mut self) -> f32 {
        unit_float_from_bits(self.next_word()) - 1.0
    }

    /// Sum twelve deviates and recenter: mean 0, variance 1 (Irwin-Hall)
    pub fn next_gaussian(&mut self) -> f32 {
        let mut sum = 0.0f32;
        for _ in 0..12 {
            sum += self.next_uniform();
        }
        sum - 6.0
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> u32 {
        self.state
    }
}

impl Default for Lcg32 {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}
