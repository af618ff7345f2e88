//! Noise Shaping Filter
//!
//! Second-order IIR low-pass used to band-limit the noise stimulus.
//! Coefficients follow the RBJ audio-EQ cookbook and are computed in f64,
//! as is the filter state, so long runs do not drift.

use core::f64::consts::{FRAC_1_SQRT_2, TAU};

use crate::config::FILTER_BYPASS_B0;

/// Biquad coefficients, normalized so that a0 = 1
///
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiquadCoeffs {
    /// Numerator coefficient b0
    pub b0: f64,
    /// Numerator coefficient b1
    pub b1: f64,
    /// Numerator coefficient b2
    pub b2: f64,
    /// Denominator coefficient a1
    pub a1: f64,
    /// Denominator coefficient a2
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Pass-through coefficients, also the "filter off" setting
    pub const UNITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Design a 2-pole Butterworth low-pass (Q = 1/sqrt(2))
    ///
    /// # Arguments
    /// * `frequency` - Cutoff frequency in Hz
    /// * `sample_rate` - Sample rate in Hz
    #[must_use]
    pub fn butterworth_lowpass(frequency: f32, sample_rate: f32) -> Self {
        let w0 = f64::from(frequency) * TAU / f64::from(sample_rate);
        let alpha = libm::sin(w0) * FRAC_1_SQRT_2;
        let cos_w0 = libm::cos(w0);
        let scale = 1.0 / (1.0 + alpha);

        let b0 = 0.5 * (1.0 - cos_w0) * scale;
        Self {
            b0,
            b1: (1.0 - cos_w0) * scale,
            b2: b0,
            a1: -2.0 * cos_w0 * scale,
            a2: (1.0 - alpha) * scale,
        }
    }

    /// Check if these coefficients skip filtering
    ///
    /// There is no separate enable flag: a cutoff near Nyquist pushes b0 past
    /// the threshold and the filter stage is bypassed.
    #[must_use]
    pub fn is_bypass(&self) -> bool {
        self.b0 > FILTER_BYPASS_B0
    }

    /// DC gain, (b0 + b1 + b2) / (1 + a1 + a2)
    #[must_use]
    pub fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }
}

impl Default for BiquadCoeffs {
    fn default() -> Self {
        Self::UNITY
    }
}

/// Direct Form II biquad state
///
/// Two delay values carry over between blocks; they are not cleared when
/// the coefficients change.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DirectForm2 {
    w1: f64,
    w2: f64,
}

impl DirectForm2 {
    /// Create a filter at rest
    #[must_use]
    pub const fn new() -> Self {
        Self { w1: 0.0, w2: 0.0 }
    }

    /// Process a single sample
    pub fn process(&mut self, c: &BiquadCoeffs, x0: f64) -> f64 {
        let y = c.b0 * x0 + self.w1;
        self.w1 = c.b1 * x0 - c.a1 * y + self.w2;
        self.w2 = c.b2 * x0 - c.a2 * y;
        y
    }

    /// Delay-line contents (w1, w2)
    #[must_use]
    pub const fn state(&self) -> (f64, f64) {
        (self.w1, self.w2)
    }

    /// Reset filter state
    pub fn reset(&mut self) {
        self.w1 = 0.0;
        self.w2 = 0.0;
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::config::AUDIO_SAMPLE_RATE_EXACT;

    #[test]
    fn unity_is_bypass() {
        assert!(BiquadCoeffs::UNITY.is_bypass());
    }

    #[test]
    fn lowpass_unit_dc_gain() {
        let c = BiquadCoeffs::butterworth_lowpass(4200.0, AUDIO_SAMPLE_RATE_EXACT);
        assert!((c.dc_gain() - 1.0).abs() < 1e-9);
        assert!(!c.is_bypass());
    }

    #[test]
    fn lowpass_near_nyquist_bypasses() {
        let c = BiquadCoeffs::butterworth_lowpass(22_000.0, AUDIO_SAMPLE_RATE_EXACT);
        assert!(c.is_bypass(), "b0 = {}", c.b0);
    }

    #[test]
    fn eighth_rate_matches_reference() {
        // fs/8 Butterworth, known-good values
        let c = BiquadCoeffs::butterworth_lowpass(AUDIO_SAMPLE_RATE_EXACT / 8.0, AUDIO_SAMPLE_RATE_EXACT);
        assert!((c.b0 - 0.097_631).abs() < 1e-4);
        assert!((c.a1 + 0.942_809).abs() < 1e-4);
        assert!((c.a2 - 0.333_333).abs() < 1e-4);
    }

    #[test]
    fn direct_form_settles_to_dc() {
        let c = BiquadCoeffs::butterworth_lowpass(1000.0, AUDIO_SAMPLE_RATE_EXACT);
        let mut f = DirectForm2::new();
        let mut y = 0.0;
        for _ in 0..2000 {
            y = f.process(&c, 0.5);
        }
        assert!((y - 0.5).abs() < 1e-6);
        f.reset();
        assert_eq!(f.state(), (0.0, 0.0));
    }
}
