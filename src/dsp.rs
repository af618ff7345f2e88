//! Digital Signal Processing
//!
//! Provides the two real-time components of the core:
//! - Gaussian noise synthesis with optional low-pass shaping
//! - 1024-point power spectrum analysis
//!
//! and their building blocks (LCG deviates, biquad, Q15 windows and FFT).

pub mod fft;
pub mod filter;
pub mod noise;
pub mod rng;
pub mod spectrum;
pub mod window;
