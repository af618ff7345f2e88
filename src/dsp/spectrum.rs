//! Spectrum Analyzer
//!
//! Accumulates incoming blocks into a 1024-sample window, then windows,
//! transforms and publishes 512 power bins (|X|^2, no square root; the
//! display only needs relative and log power).
//!
//! The bin array and its `available` flag are the only state shared with
//! readers outside the audio callback. Bins are written in full before the
//! flag is raised with `Release`, and the reader consumes the flag with an
//! `Acquire` swap, so a reader that saw the flag never sees a half-written
//! spectrum.

use core::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "embedded")]
use micromath::F32Ext;

use super::fft::{FftBuffer, Radix4Fft};
use super::window::{WindowShape, WindowTable};
use crate::block::{BlockPool, BlockRef};
use crate::config::{AUDIO_SAMPLE_RATE_EXACT, FFT_LEN, SPECTRUM_BINS, SPECTRUM_DB_FLOOR};
use crate::node::AudioNode;

/// Window advance between computations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Overlap {
    /// A fresh 1024 samples per spectrum
    #[default]
    None,
    /// 50 % overlap: a spectrum every 512 samples once the first window is full
    Half,
}

impl Overlap {
    /// New samples needed between computations
    #[must_use]
    pub const fn hop(self) -> usize {
        match self {
            Self::None => FFT_LEN,
            Self::Half => FFT_LEN / 2,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Overlap {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::None => defmt::write!(f, "none"),
            Self::Half => defmt::write!(f, "50%"),
        }
    }
}

/// 1024-point power spectrum analyzer
pub struct SpectrumAnalyzer<'w> {
    window: &'w WindowTable,
    fft: Radix4Fft,
    overlap: Overlap,
    /// Samples gathered for the next window
    samples: [i16; FFT_LEN],
    fill: usize,
    /// Transform working storage, overwritten every pass
    scratch: FftBuffer,
    output: [f32; SPECTRUM_BINS],
    ready: AtomicBool,
    windows: u32,
}

impl<'w> SpectrumAnalyzer<'w> {
    /// Create an analyzer using `window`
    #[must_use]
    pub fn new(window: &'w WindowTable) -> Self {
        Self {
            window,
            fft: Radix4Fft::new(),
            overlap: Overlap::default(),
            samples: [0; FFT_LEN],
            fill: 0,
            scratch: [0; 2 * FFT_LEN],
            output: [0.0; SPECTRUM_BINS],
            ready: AtomicBool::new(false),
            windows: 0,
        }
    }

    /// True once per published spectrum; reading clears it
    pub fn available(&self) -> bool {
        self.ready.swap(false, Ordering::AcqRel)
    }

    /// Power in a bin, 0.0 for any bin past the last
    #[must_use]
    pub fn read(&self, bin: usize) -> f32 {
        self.output.get(bin).copied().unwrap_or(0.0)
    }

    /// Power in a bin in dB, floored at `SPECTRUM_DB_FLOOR`
    #[must_use]
    pub fn read_db(&self, bin: usize) -> f32 {
        let power = self.read(bin);
        if power > 0.0 {
            (10.0 * power.log10()).max(SPECTRUM_DB_FLOOR)
        } else {
            SPECTRUM_DB_FLOOR
        }
    }

    /// Bin with the most power, with that power
    #[must_use]
    pub fn peak(&self) -> (usize, f32) {
        self.output
            .iter()
            .copied()
            .enumerate()
            .fold((0, 0.0), |best, (bin, p)| if p > best.1 { (bin, p) } else { best })
    }

    /// Centre frequency of a bin in Hz
    #[must_use]
    pub fn bin_frequency(bin: usize) -> f32 {
        bin as f32 * AUDIO_SAMPLE_RATE_EXACT / FFT_LEN as f32
    }

    /// Swap the window table; used from the next computed spectrum on
    ///
    /// Must not race the periodic update.
    pub fn window_function(&mut self, window: &'w WindowTable) {
        self.window = window;
        #[cfg(feature = "embedded")]
        defmt::debug!("analyzer window -> {}", window.shape());
    }

    /// Shape of the active window
    #[must_use]
    pub fn window_shape(&self) -> WindowShape {
        self.window.shape()
    }

    /// Select the window advance
    pub fn set_overlap(&mut self, overlap: Overlap) {
        self.overlap = overlap;
    }

    /// Current window advance
    #[must_use]
    pub const fn overlap(&self) -> Overlap {
        self.overlap
    }

    /// Spectra published since construction (wraps)
    #[must_use]
    pub const fn windows_computed(&self) -> u32 {
        self.windows
    }

    /// Samples waiting in the partial window
    #[must_use]
    pub const fn pending_samples(&self) -> usize {
        self.fill
    }

    /// Drop the partial window
    pub fn reset(&mut self) {
        self.fill = 0;
    }

    /// Append samples of any length; computes each time the window fills
    ///
    /// Samples past a window boundary start the next window, so a slice
    /// spanning several windows publishes several spectra and only the last
    /// stays readable.
    pub fn ingest(&mut self, mut samples: &[i16]) {
        while !samples.is_empty() {
            let take = samples.len().min(FFT_LEN - self.fill);
            let (head, rest) = samples.split_at(take);
            self.samples[self.fill..self.fill + take].copy_from_slice(head);
            self.fill += take;
            samples = rest;

            if self.fill == FFT_LEN {
                self.compute();
                let hop = self.overlap.hop();
                self.samples.copy_within(hop.., 0);
                self.fill = FFT_LEN - hop;
            }
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn compute(&mut self) {
        let coeffs = self.window.coefficients();
        for (i, (&x, w)) in self.samples.iter().zip(coeffs.iter()).enumerate() {
            let product = (i32::from(x) * i32::from(w.to_bits()) + (1 << 14)) >> 15;
            self.scratch[2 * i] = product as i16;
            self.scratch[2 * i + 1] = 0;
        }

        self.fft.process(&mut self.scratch);

        for (bin, out) in self.output.iter_mut().enumerate() {
            let re = i64::from(self.scratch[2 * bin]);
            let im = i64::from(self.scratch[2 * bin + 1]);
            *out = (re * re + im * im) as f32;
        }

        self.windows = self.windows.wrapping_add(1);
        self.ready.store(true, Ordering::Release);
        #[cfg(feature = "embedded")]
        defmt::trace!("spectrum #{} published", self.windows);
    }
}

impl AudioNode for SpectrumAnalyzer<'_> {
    const INPUTS: usize = 1;
    const OUTPUTS: usize = 0;

    fn update<const N: usize>(
        &mut self,
        pool: &mut BlockPool<N>,
        input: Option<BlockRef>,
    ) -> Option<BlockRef> {
        if let Some(block) = input {
            self.ingest(pool.data(&block));
            pool.release(block);
        }
        None
    }
}
