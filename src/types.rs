//! Shared types used across the DSP core
//!
//! Domain types that carry their invariants with them: an amplitude can
//! never be negative, and sample quantization always saturates.

use core::fmt;

use crate::config::{
    AMPLITUDE_BYPASS_THRESHOLD, AUDIO_BLOCK_SAMPLES, SAMPLE_NEGATIVE_LIMIT, SAMPLE_POSITIVE_LIMIT,
};

/// One block of signed 16-bit audio
pub type AudioBlock = [i16; AUDIO_BLOCK_SAMPLES];

/// Silent block
pub const SILENT_BLOCK: AudioBlock = [0; AUDIO_BLOCK_SAMPLES];

/// Noise standard deviation, relative to full scale
///
/// An sd of 1.0 spans the whole int16 range at one sigma, so 0.333 keeps
/// clipping near the 3-sigma rate.
#[derive(Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Amplitude(f32);

impl Amplitude {
    /// Generator off
    pub const ZERO: Self = Self(0.0);

    /// Create an amplitude, clamping negative and NaN input to zero
    #[must_use]
    pub fn new(sd: f32) -> Self {
        if sd > 0.0 {
            Self(sd)
        } else {
            Self::ZERO
        }
    }

    /// Get the standard deviation
    #[must_use]
    pub const fn as_f32(self) -> f32 {
        self.0
    }

    /// Check if the generator produces anything at this level
    #[must_use]
    pub fn is_audible(self) -> bool {
        self.0 >= AMPLITUDE_BYPASS_THRESHOLD
    }
}

impl fmt::Debug for Amplitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amplitude(sd={})", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Amplitude {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "sd={}", self.0);
    }
}

/// Quantize a full-scale float sample to int16
///
/// Saturates above 0.9999695 and below -1.0, otherwise rounds half away
/// from zero after scaling by 32768. Never wraps.
#[must_use]
pub fn quantize(value: f32) -> i16 {
    if value > SAMPLE_POSITIVE_LIMIT {
        i16::MAX
    } else if value < SAMPLE_NEGATIVE_LIMIT {
        i16::MIN
    } else {
        let scaled = f64::from(32768.0 * value);
        let rounded = if scaled >= 0.0 {
            scaled + 0.5
        } else {
            scaled - 0.5
        };
        #[allow(clippy::cast_possible_truncation)]
        let sample = rounded as i16;
        sample
    }
}

/// Convert an int16 sample to full-scale float
#[must_use]
pub fn to_unit(sample: i16) -> f32 {
    f32::from(sample) / 32768.0
}
