//! Gaussian Noise Synthesizer
//!
//! Calibrated white-noise stimulus with an optional 2-pole low-pass.
//! Each output sample is the Irwin-Hall sum of twelve LCG deviates,
//! recentered and scaled to the requested standard deviation, optionally
//! shaped by a Direct Form II biquad and quantized to int16 with
//! saturation.
//!
//! The generator has no explicit enable flag. It is off below
//! `AMPLITUDE_BYPASS_THRESHOLD` and skips the filter whenever b0 exceeds
//! `FILTER_BYPASS_B0`, which is what a cutoff near Nyquist produces.
//!
//! Setters are not atomic with respect to `update`; the caller serializes
//! them against the audio callback.

use super::filter::{BiquadCoeffs, DirectForm2};
use super::rng::Lcg32;
use crate::block::{BlockPool, BlockRef};
use crate::config::{AUDIO_SAMPLE_RATE_EXACT, DEFAULT_SEED};
use crate::node::AudioNode;
use crate::types::{quantize, Amplitude, AudioBlock};

/// Operating state implied by the current parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoiseMode {
    /// Amplitude below threshold, output is silence
    Disabled,
    /// White noise, filter bypassed
    Unfiltered,
    /// Low-pass shaped noise
    Filtered,
}

#[cfg(feature = "embedded")]
impl defmt::Format for NoiseMode {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Disabled => defmt::write!(f, "off"),
            Self::Unfiltered => defmt::write!(f, "white"),
            Self::Filtered => defmt::write!(f, "low-pass"),
        }
    }
}

/// Generator settings
///
/// Immutable value; every change produces a new one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseParams {
    amplitude: Amplitude,
    coeffs: BiquadCoeffs,
}

impl NoiseParams {
    /// Silent, unfiltered
    pub const OFF: Self = Self {
        amplitude: Amplitude::ZERO,
        coeffs: BiquadCoeffs::UNITY,
    };

    /// Same settings with a new standard deviation (negative clamps to 0)
    #[must_use]
    pub fn with_amplitude(self, sd: f32) -> Self {
        Self {
            amplitude: Amplitude::new(sd),
            ..self
        }
    }

    /// Same settings with a Butterworth low-pass at `frequency` Hz
    #[must_use]
    pub fn with_low_pass(self, frequency: f32) -> Self {
        Self {
            coeffs: BiquadCoeffs::butterworth_lowpass(frequency, AUDIO_SAMPLE_RATE_EXACT),
            ..self
        }
    }

    /// Same settings with the filter set to pass-through
    #[must_use]
    pub fn without_low_pass(self) -> Self {
        Self {
            coeffs: BiquadCoeffs::UNITY,
            ..self
        }
    }

    /// Standard deviation
    #[must_use]
    pub const fn amplitude(&self) -> Amplitude {
        self.amplitude
    }

    /// Filter coefficients
    #[must_use]
    pub const fn coeffs(&self) -> &BiquadCoeffs {
        &self.coeffs
    }

    /// Derived operating state
    #[must_use]
    pub fn mode(&self) -> NoiseMode {
        if !self.amplitude.is_audible() {
            NoiseMode::Disabled
        } else if self.coeffs.is_bypass() {
            NoiseMode::Unfiltered
        } else {
            NoiseMode::Filtered
        }
    }
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self::OFF
    }
}

/// Block-based Gaussian noise source
#[derive(Clone, Debug)]
pub struct NoiseSynth {
    params: NoiseParams,
    rng: Lcg32,
    filter: DirectForm2,
}

impl NoiseSynth {
    /// Create a silent generator with the default seed
    #[must_use]
    pub const fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    /// Create a silent generator with a given seed
    #[must_use]
    pub const fn with_seed(seed: u32) -> Self {
        Self {
            params: NoiseParams::OFF,
            rng: Lcg32::new(seed),
            filter: DirectForm2::new(),
        }
    }

    /// Set the standard deviation; negative values clamp to 0
    pub fn amplitude(&mut self, sd: f32) {
        self.params = self.params.with_amplitude(sd);
        #[cfg(feature = "embedded")]
        defmt::debug!("noise {}", self.params.amplitude());
    }

    /// Set the low-pass cutoff in Hz
    ///
    /// A cutoff within a few percent of Nyquist turns the filter off.
    /// Filter history is kept across the change.
    pub fn set_low_pass(&mut self, frequency: f32) {
        self.params = self.params.with_low_pass(frequency);
        #[cfg(feature = "embedded")]
        defmt::debug!("noise low-pass {} Hz, b0={}", frequency, self.params.coeffs().b0);
    }

    /// Restore pass-through coefficients
    pub fn clear_low_pass(&mut self) {
        self.params = self.params.without_low_pass();
    }

    /// Replace the whole parameter set
    pub fn set_params(&mut self, params: NoiseParams) {
        self.params = params;
    }

    /// Reseed the LCG
    pub fn set_seed(&mut self, seed: u32) {
        self.rng = Lcg32::new(seed);
        #[cfg(feature = "embedded")]
        defmt::debug!("noise seed {}", seed);
    }

    /// Current parameters
    #[must_use]
    pub const fn params(&self) -> &NoiseParams {
        &self.params
    }

    /// Derived operating state
    #[must_use]
    pub fn mode(&self) -> NoiseMode {
        self.params.mode()
    }

    /// Current LCG state
    #[must_use]
    pub const fn seed(&self) -> u32 {
        self.rng.state()
    }

    /// Generate one block
    pub fn fill(&mut self, block: &mut AudioBlock) {
        let sd = self.params.amplitude.as_f32();
        if !self.params.amplitude.is_audible() {
            block.fill(0);
            return;
        }

        let coeffs = self.params.coeffs;
        let bypass = coeffs.is_bypass();
        for out in block.iter_mut() {
            let x = sd * self.rng.next_gaussian();
            let y = if bypass {
                x
            } else {
                #[allow(clippy::cast_possible_truncation)]
                let shaped = self.filter.process(&coeffs, f64::from(x)) as f32;
                shaped
            };
            *out = quantize(y);
        }
    }
}

impl Default for NoiseSynth {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioNode for NoiseSynth {
    const INPUTS: usize = 0;
    const OUTPUTS: usize = 1;

    fn update<const N: usize>(
        &mut self,
        pool: &mut BlockPool<N>,
        input: Option<BlockRef>,
    ) -> Option<BlockRef> {
        if let Some(stray) = input {
            pool.release(stray);
        }

        let Some(block) = pool.acquire() else {
            #[cfg(feature = "embedded")]
            defmt::warn!("noise: pool exhausted, frame dropped");
            return None;
        };
        let Some(data) = pool.data_mut(&block) else {
            pool.release(block);
            return None;
        };
        self.fill(data);
        Some(block)
    }
}
