//! Audio Network Analyzer DSP Core
//!
//! Real-time signal core for an audio-band network analyzer built around a
//! 44.1 kHz stereo codec. Two streaming components run once per 128-sample
//! block: a calibrated Gaussian noise synthesizer used as a stimulus, and a
//! 1024-point fixed-point spectrum analyzer that publishes 512 power bins.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      CONTROL LAYER                           │
//! │  Serial Command Dictionary  │  Persisted Parameter Record    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    SCHEDULING PORT                           │
//! │  Pipeline (one tick per block)  │  AudioNode trait           │
//! ├─────────────────────────────────────────────────────────────┤
//! │                       DSP LAYER                              │
//! │  Noise Synthesizer (LCG, biquad)  │  Spectrum Analyzer (FFT) │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    BLOCK POOL                                │
//! │         fixed, reference-counted 128-sample buffers          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **No allocation, no blocking** in the periodic path
//! - **Degrade, don't fail**: pool exhaustion drops a frame, out-of-range
//!   reads return zero, overflow saturates
//! - **Immutable parameters**: generator settings are swapped as a value
//! - **Single-writer output**: spectra are published with a release flag

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

// Re-export dependencies needed by the firmware binary
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

/// Audio Block Pool
///
/// Fixed set of reference-counted sample buffers.
pub mod block;

/// Streaming Node Interface
///
/// Port arity and the per-quantum update hook.
pub mod node;

/// Digital Signal Processing
///
/// Noise synthesis, windows, FFT and spectrum analysis.
pub mod dsp;

/// Block Scheduler
///
/// Reference pipeline wiring the generator and analyzer to one pool.
pub mod runtime;

/// Communication Protocols
///
/// Serial command dictionary and stock control commands.
pub mod protocol;

/// Persisted Parameters
///
/// Startup record with generator defaults and calibration tables.
pub mod params;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
#[cfg(feature = "embedded")]
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    pub use crate::block::{BlockPool, BlockRef};
    pub use crate::dsp::window::{WindowShape, WindowTable};
    pub use crate::node::AudioNode;
    pub use crate::params::ParamRecord;
    pub use crate::protocol::{CommandDictionary, Dispatch, ResponseMode};
    pub use crate::runtime::{Pipeline, Route};

    // Embassy
    pub use embassy_time::{Duration, Instant, Ticker, Timer};

    // Error handling
    pub use core::result::Result;

    // Logging
    pub use defmt::{debug, error, info, trace, warn};
}
