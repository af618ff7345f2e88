//! Analysis Window Tables
//!
//! Q15 coefficient tables of exactly `FFT_LEN` entries. Tables are built
//! once, outside the audio path, and handed to the analyzer by shared
//! reference. All shapes are symmetric over `FFT_LEN - 1`.

use core::f64::consts::{PI, TAU};

use fixed::types::I1F15;
#[cfg(feature = "embedded")]
use micromath::F32Ext;

use crate::config::{FFT_LEN, SPECTRUM_ROUNDING_FLOOR};

/// Q1.15 window coefficient
pub type Coefficient = I1F15;

/// Available window shapes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WindowShape {
    /// Hann (raised cosine)
    Hanning,
    /// Triangular
    Bartlett,
    /// Classic 3-term Blackman
    Blackman,
    /// 5-term flat top, normalized to unit peak
    Flattop,
    /// 4-term Blackman-Harris, -92 dB sidelobes
    #[default]
    BlackmanHarris,
    /// 4-term Nuttall
    Nuttall,
    /// 4-term Blackman-Nuttall
    BlackmanNuttall,
    /// Parabolic
    Welch,
    /// Hamming
    Hamming,
    /// Half-period sine
    Cosine,
    /// Tapered cosine, 50 % taper
    Tukey,
}

impl WindowShape {
    /// All shapes, in id order
    pub const ALL: [Self; 11] = [
        Self::Hanning,
        Self::Bartlett,
        Self::Blackman,
        Self::Flattop,
        Self::BlackmanHarris,
        Self::Nuttall,
        Self::BlackmanNuttall,
        Self::Welch,
        Self::Hamming,
        Self::Cosine,
        Self::Tukey,
    ];

    /// Stable numeric id, used by the persisted parameter record
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Look up a shape by id
    #[must_use]
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(usize::from(id)).copied()
    }

    /// Highest sidelobe level in dB, from the shape's continuous form
    #[must_use]
    pub const fn sidelobe_db(self) -> f32 {
        match self {
            Self::Hanning => -31.5,
            Self::Bartlett => -26.5,
            Self::Blackman => -58.1,
            Self::Flattop => -93.0,
            Self::BlackmanHarris => -92.0,
            Self::Nuttall => -93.3,
            Self::BlackmanNuttall => -98.1,
            Self::Welch => -21.3,
            Self::Hamming => -42.7,
            Self::Cosine => -23.0,
            Self::Tukey => -15.1,
        }
    }

    /// Highest power a bin outside the main lobe may show for a tone of
    /// `peak_power`, never below the fixed-point rounding floor
    #[must_use]
    pub fn leakage_bound(self, peak_power: f32) -> f32 {
        (peak_power * 10.0f32.powf(self.sidelobe_db() / 10.0)).max(SPECTRUM_ROUNDING_FLOOR)
    }

    /// Main-lobe half width in bins
    #[must_use]
    pub const fn main_lobe_bins(self) -> usize {
        match self {
            Self::Hanning | Self::Bartlett | Self::Hamming | Self::Welch | Self::Cosine | Self::Tukey => 2,
            Self::Blackman => 3,
            Self::BlackmanHarris | Self::Nuttall | Self::BlackmanNuttall => 4,
            Self::Flattop => 5,
        }
    }

    /// Evaluate the continuous window at index `i` of `FFT_LEN`
    #[must_use]
    pub fn value(self, i: usize) -> f64 {
        let m = (FFT_LEN - 1) as f64;
        let n = i as f64;
        let x = TAU * n / m;
        match self {
            Self::Hanning => cosine_sum(&[0.5, 0.5], x),
            Self::Bartlett => 1.0 - libm::fabs(2.0 * n / m - 1.0),
            Self::Blackman => cosine_sum(&[0.42, 0.5, 0.08], x),
            Self::Flattop => cosine_sum(
                &[0.215_578_95, 0.416_631_58, 0.277_263_158, 0.083_578_947, 0.006_947_368],
                x,
            ),
            Self::BlackmanHarris => cosine_sum(&[0.358_75, 0.488_29, 0.141_28, 0.011_68], x),
            Self::Nuttall => cosine_sum(&[0.355_768, 0.487_396, 0.144_232, 0.012_604], x),
            Self::BlackmanNuttall => {
                cosine_sum(&[0.363_581_9, 0.489_177_5, 0.136_599_5, 0.010_641_1], x)
            }
            Self::Welch => {
                let half = m / 2.0;
                let t = (n - half) / half;
                1.0 - t * t
            }
            Self::Hamming => cosine_sum(&[0.54, 0.46], x),
            Self::Cosine => libm::sin(PI * n / m),
            Self::Tukey => tukey(n / m, 0.5),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for WindowShape {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Hanning => defmt::write!(f, "Hanning"),
            Self::Bartlett => defmt::write!(f, "Bartlett"),
            Self::Blackman => defmt::write!(f, "Blackman"),
            Self::Flattop => defmt::write!(f, "Flattop"),
            Self::BlackmanHarris => defmt::write!(f, "Blackman-Harris"),
            Self::Nuttall => defmt::write!(f, "Nuttall"),
            Self::BlackmanNuttall => defmt::write!(f, "Blackman-Nuttall"),
            Self::Welch => defmt::write!(f, "Welch"),
            Self::Hamming => defmt::write!(f, "Hamming"),
            Self::Cosine => defmt::write!(f, "Cosine"),
            Self::Tukey => defmt::write!(f, "Tukey"),
        }
    }
}

/// a0 - a1 cos x + a2 cos 2x - a3 cos 3x + ...
fn cosine_sum(a: &[f64], x: f64) -> f64 {
    a.iter()
        .enumerate()
        .map(|(k, &ak)| {
            let term = ak * libm::cos(k as f64 * x);
            if k % 2 == 0 {
                term
            } else {
                -term
            }
        })
        .sum()
}

/// Tukey window at normalized position `t` in [0, 1]
fn tukey(t: f64, alpha: f64) -> f64 {
    let edge = alpha / 2.0;
    if t < edge {
        0.5 * (1.0 - libm::cos(PI * t / edge))
    } else if t > 1.0 - edge {
        0.5 * (1.0 - libm::cos(PI * (1.0 - t) / edge))
    } else {
        1.0
    }
}

/// Immutable window of `FFT_LEN` Q15 coefficients
#[derive(Clone)]
pub struct WindowTable {
    shape: WindowShape,
    coeffs: [Coefficient; FFT_LEN],
}

impl WindowTable {
    /// Build the table for a shape. Not for use in the audio path.
    #[must_use]
    pub fn new(shape: WindowShape) -> Self {
        let coeffs = core::array::from_fn(|i| Coefficient::saturating_from_num(shape.value(i)));
        Self { shape, coeffs }
    }

    /// Shape this table was built from
    #[must_use]
    pub const fn shape(&self) -> WindowShape {
        self.shape
    }

    /// Coefficients
    #[must_use]
    pub fn coefficients(&self) -> &[Coefficient; FFT_LEN] {
        &self.coeffs
    }

    /// Mean coefficient, the amplitude loss for a coherent tone
    #[must_use]
    pub fn coherent_gain(&self) -> f32 {
        let sum: i32 = self.coeffs.iter().map(|c| i32::from(c.to_bits())).sum();
        sum as f32 / (FFT_LEN as f32 * 32768.0)
    }
}

impl Default for WindowTable {
    fn default() -> Self {
        Self::new(WindowShape::default())
    }
}

impl core::fmt::Debug for WindowTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "WindowTable({:?})", self.shape)
    }
}
