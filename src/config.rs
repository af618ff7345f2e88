//! System configuration and DSP constants
//!
//! Block geometry, sample rate, transform size and the numeric thresholds
//! that gate the generator are centralized here. Everything is fixed at
//! compile time; runtime defaults come from the persisted parameter record.

use crate::dsp::window::WindowShape;

/// Samples per audio block
pub const AUDIO_BLOCK_SAMPLES: usize = 128;

/// Exact codec sample rate in Hz (44.1 kHz nominal, derived from the MCLK divider)
pub const AUDIO_SAMPLE_RATE_EXACT: f32 = 44_117.647;

/// Transform length of the spectrum analyzer
pub const FFT_LEN: usize = 1024;

/// Number of published power bins
pub const SPECTRUM_BINS: usize = FFT_LEN / 2;

/// Audio blocks needed to fill one analysis window
pub const BLOCKS_PER_WINDOW: usize = FFT_LEN / AUDIO_BLOCK_SAMPLES;

/// Number of buffers in the shared block pool
pub const BLOCK_POOL_CAPACITY: usize = 12;

/// Generator output is forced to silence below this standard deviation
pub const AMPLITUDE_BYPASS_THRESHOLD: f32 = 0.000_01;

/// The low-pass stage is skipped when b0 exceeds this value.
///
/// A Butterworth section tuned close to Nyquist has b0 near 1.0, so this
/// doubles as the "filter off" marker. Unity coefficients (b0 = 1.0) land
/// here too.
pub const FILTER_BYPASS_B0: f64 = 0.95;

/// Largest float that quantizes below full scale
pub const SAMPLE_POSITIVE_LIMIT: f32 = 0.999_969_5;

/// Most negative float that quantizes without clamping
pub const SAMPLE_NEGATIVE_LIMIT: f32 = -1.0;

/// Initial LCG state of a freshly built generator
pub const DEFAULT_SEED: u32 = 1_357_246_891;

/// Default analyzer window
pub const DEFAULT_WINDOW: WindowShape = WindowShape::BlackmanHarris;

/// Floor reported by dB readouts for empty or invalid bins
pub const SPECTRUM_DB_FLOOR: f32 = -100.0;

/// Bin power reachable through Q15 rounding alone (about 8 LSB of magnitude
/// after five scaled stages)
pub const SPECTRUM_ROUNDING_FLOOR: f32 = 64.0;

/// Command line buffer size
pub const COMMAND_BUFFER_SIZE: usize = 50;

/// Maximum number of registered commands
pub const MAX_COMMANDS: usize = 16;

/// Command response buffer size
pub const RESPONSE_BUFFER_SIZE: usize = 64;

/// Default command terminator
pub const DEFAULT_COMMAND_TERMINATOR: u8 = b'\r';

/// Duration of one scheduler quantum in microseconds
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn quantum_us() -> u32 {
    (AUDIO_BLOCK_SAMPLES as f32 * 1_000_000.0 / AUDIO_SAMPLE_RATE_EXACT) as u32
}
