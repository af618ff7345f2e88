//! Persisted Parameter Record
//!
//! Fixed-layout, little-endian record kept in non-volatile storage and
//! decoded once at startup. It carries the generator defaults plus the
//! instrument's calibration tables. A magic word marks valid storage and a
//! version byte guards against layout changes.
//!
//! ```text
//! offset size field
//!      0    2 magic 0x433B
//!      2    1 version
//!      3    4 noise amplitude (f32)
//!      7    4 low-pass cutoff in Hz (f32, 0 = off)
//!     11    4 LCG seed (u32)
//!     15    1 window shape id
//!     16    4 signal generator calibration (f32)
//!     20    4 spectrum analyzer correction in dB (f32)
//!     24  104 voltage-ratio calibration, 13 x f64
//!    128  104 phase calibration, 13 x f64
//! ```

use core::fmt;

use crate::config::{DEFAULT_SEED, DEFAULT_WINDOW};
use crate::dsp::window::WindowShape;

/// Marks initialized storage
pub const PARAM_MAGIC: u16 = 0x433B;

/// Layout version written by this firmware
pub const PARAM_VERSION: u8 = 1;

/// Quasi-log calibration frequencies
pub const CAL_POINTS: usize = 13;

/// Encoded size in bytes
pub const RECORD_LEN: usize = 24 + 2 * 8 * CAL_POINTS;

/// Parameter decode errors
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamError {
    /// Fewer bytes than a full record
    Truncated {
        /// Bytes required
        expected: usize,
        /// Bytes supplied
        found: usize,
    },
    /// Storage was never initialized
    BadMagic(u16),
    /// Record written by an incompatible layout
    UnsupportedVersion(u8),
    /// Window id out of range
    UnknownWindow(u8),
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { expected, found } => {
                write!(f, "record truncated: need {expected} bytes, got {found}")
            }
            Self::BadMagic(magic) => write!(f, "bad magic 0x{magic:04X}"),
            Self::UnsupportedVersion(v) => write!(f, "unsupported record version {v}"),
            Self::UnknownWindow(id) => write!(f, "unknown window id {id}"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ParamError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Truncated { expected, found } => {
                defmt::write!(f, "truncated ({}/{})", found, expected);
            }
            Self::BadMagic(magic) => defmt::write!(f, "bad magic {=u16:#x}", magic),
            Self::UnsupportedVersion(v) => defmt::write!(f, "version {}", v),
            Self::UnknownWindow(id) => defmt::write!(f, "window id {}", id),
        }
    }
}

/// Decoded startup parameters
#[derive(Clone, Debug, PartialEq)]
pub struct ParamRecord {
    /// Noise standard deviation
    pub noise_amplitude: f32,
    /// Noise low-pass cutoff, `None` for white noise
    pub low_pass_hz: Option<f32>,
    /// Generator seed
    pub seed: u32,
    /// Analyzer window
    pub window: WindowShape,
    /// Signal generator output calibration
    pub sg_cal: f32,
    /// Spectrum analyzer level correction in dB
    pub sa_correction_db: f32,
    /// Voltage-ratio magnitude calibration
    pub voltage_ratio_cal: [f64; CAL_POINTS],
    /// Phase difference calibration
    pub phase_cal: [f64; CAL_POINTS],
}

impl Default for ParamRecord {
    fn default() -> Self {
        Self {
            noise_amplitude: 0.0,
            low_pass_hz: None,
            seed: DEFAULT_SEED,
            window: DEFAULT_WINDOW,
            sg_cal: 1.5792,
            sa_correction_db: 4.5,
            voltage_ratio_cal: [1.0; CAL_POINTS],
            phase_cal: [0.0; CAL_POINTS],
        }
    }
}

impl ParamRecord {
    /// Decode a record from storage
    ///
    /// # Errors
    /// Returns a [`ParamError`] for short input, missing magic, a foreign
    /// version, or an unknown window id.
    pub fn decode(bytes: &[u8]) -> Result<Self, ParamError> {
        if bytes.len() < RECORD_LEN {
            return Err(ParamError::Truncated {
                expected: RECORD_LEN,
                found: bytes.len(),
            });
        }

        let mut r = Reader { bytes, pos: 0 };
        let magic = u16::from_le_bytes(r.take());
        if magic != PARAM_MAGIC {
            return Err(ParamError::BadMagic(magic));
        }
        let [version] = r.take();
        if version != PARAM_VERSION {
            return Err(ParamError::UnsupportedVersion(version));
        }

        let noise_amplitude = f32::from_le_bytes(r.take());
        let cutoff = f32::from_le_bytes(r.take());
        let seed = u32::from_le_bytes(r.take());
        let [window_id] = r.take();
        let window = WindowShape::from_id(window_id).ok_or(ParamError::UnknownWindow(window_id))?;
        let sg_cal = f32::from_le_bytes(r.take());
        let sa_correction_db = f32::from_le_bytes(r.take());
        let voltage_ratio_cal = core::array::from_fn(|_| f64::from_le_bytes(r.take()));
        let phase_cal = core::array::from_fn(|_| f64::from_le_bytes(r.take()));

        Ok(Self {
            noise_amplitude,
            low_pass_hz: (cutoff > 0.0).then_some(cutoff),
            seed,
            window,
            sg_cal,
            sa_correction_db,
            voltage_ratio_cal,
            phase_cal,
        })
    }

    /// Encode for storage
    #[must_use]
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut out = [0u8; RECORD_LEN];
        let mut w = Writer { bytes: &mut out, pos: 0 };
        w.put(&PARAM_MAGIC.to_le_bytes());
        w.put(&[PARAM_VERSION]);
        w.put(&self.noise_amplitude.to_le_bytes());
        w.put(&self.low_pass_hz.unwrap_or(0.0).to_le_bytes());
        w.put(&self.seed.to_le_bytes());
        w.put(&[self.window.id()]);
        w.put(&self.sg_cal.to_le_bytes());
        w.put(&self.sa_correction_db.to_le_bytes());
        for v in &self.voltage_ratio_cal {
            w.put(&v.to_le_bytes());
        }
        for v in &self.phase_cal {
            w.put(&v.to_le_bytes());
        }
        out
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    /// Caller has checked the total length
    fn take<const K: usize>(&mut self) -> [u8; K] {
        let mut raw = [0u8; K];
        raw.copy_from_slice(&self.bytes[self.pos..self.pos + K]);
        self.pos += K;
        raw
    }
}

struct Writer<'a> {
    bytes: &'a mut [u8],
    pos: usize,
}

impl Writer<'_> {
    fn put(&mut self, data: &[u8]) {
        self.bytes[self.pos..self.pos + data.len()].copy_from_slice(data);
        self.pos += data.len();
    }
}
