//! Fixed-Point FFT
//!
//! 1024-point complex radix-4 decimation-in-frequency transform on
//! interleaved Q15 data. Each of the five stages scales by 1/4, so the
//! output is the DFT divided by 1024 and cannot overflow for in-range
//! input. Products are rounded; results that would still exceed int16
//! saturate.

use fixed::types::I1F15;

use crate::config::FFT_LEN;

/// Interleaved (re, im) working buffer
pub type FftBuffer = [i16; 2 * FFT_LEN];

/// Base-4 digits in an index (4^5 = 1024)
const DIGITS: u32 = 5;

/// Largest twiddle index used (3 * (N/4 - 1)), plus one
const TWIDDLE_LEN: usize = 3 * FFT_LEN / 4;

/// Radix-4 transform with precomputed Q15 twiddles
pub struct Radix4Fft {
    /// (cos, sin) of 2*pi*k/N
    twiddles: [(i16, i16); TWIDDLE_LEN],
}

impl Radix4Fft {
    /// Build the twiddle table. Not for use in the audio path.
    #[must_use]
    pub fn new() -> Self {
        let twiddles = core::array::from_fn(|k| {
            let angle = core::f64::consts::TAU * k as f64 / FFT_LEN as f64;
            (q15(libm::cos(angle)), q15(libm::sin(angle)))
        });
        Self { twiddles }
    }

    /// Forward transform in place, output in natural order
    pub fn process(&self, buf: &mut FftBuffer) {
        let mut span = FFT_LEN;
        let mut stride = 1;

        while span > 1 {
            let quarter = span / 4;
            for j in 0..quarter {
                let w1 = self.twiddles[j * stride];
                let w2 = self.twiddles[2 * j * stride];
                let w3 = self.twiddles[3 * j * stride];

                let mut i0 = j;
                while i0 < FFT_LEN {
                    let i1 = i0 + quarter;
                    let i2 = i1 + quarter;
                    let i3 = i2 + quarter;

                    let (x0r, x0i) = load_quarter(buf, i0);
                    let (x1r, x1i) = load_quarter(buf, i1);
                    let (x2r, x2i) = load_quarter(buf, i2);
                    let (x3r, x3i) = load_quarter(buf, i3);

                    let (ar, ai) = (x0r + x2r, x0i + x2i);
                    let (br, bi) = (x0r - x2r, x0i - x2i);
                    let (cr, ci) = (x1r + x3r, x1i + x3i);
                    let (dr, di) = (x1r - x3r, x1i - x3i);

                    store(buf, i0, ar + cr, ai + ci);
                    // b - j*d
                    store_rotated(buf, i1, br + di, bi - dr, w1);
                    store_rotated(buf, i2, ar - cr, ai - ci, w2);
                    // b + j*d
                    store_rotated(buf, i3, br - di, bi + dr, w3);

                    i0 += span;
                }
            }
            stride *= 4;
            span = quarter;
        }

        digit_reverse(buf);
    }
}

impl Default for Radix4Fft {
    fn default() -> Self {
        Self::new()
    }
}

fn q15(value: f64) -> i16 {
    I1F15::saturating_from_num(value).to_bits()
}

fn saturate(value: i32) -> i16 {
    #[allow(clippy::cast_possible_truncation)]
    let clamped = value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
    clamped
}

/// Load one complex point scaled by 1/4 with rounding
#[inline]
fn load_quarter(buf: &FftBuffer, index: usize) -> (i32, i32) {
    (
        (i32::from(buf[2 * index]) + 2) >> 2,
        (i32::from(buf[2 * index + 1]) + 2) >> 2,
    )
}

#[inline]
fn store(buf: &mut FftBuffer, index: usize, re: i32, im: i32) {
    buf[2 * index] = saturate(re);
    buf[2 * index + 1] = saturate(im);
}

/// Store (re + j im) * (cos - j sin)
#[inline]
fn store_rotated(buf: &mut FftBuffer, index: usize, re: i32, im: i32, w: (i16, i16)) {
    let (c, s) = (i64::from(w.0), i64::from(w.1));
    let (re, im) = (i64::from(re), i64::from(im));
    let out_re = (re * c + im * s + (1 << 14)) >> 15;
    let out_im = (im * c - re * s + (1 << 14)) >> 15;
    #[allow(clippy::cast_possible_truncation)]
    store(buf, index, out_re as i32, out_im as i32);
}

/// Reverse the base-4 digits of a 10-bit index
#[inline]
fn reverse_digits(mut index: usize) -> usize {
    let mut reversed = 0;
    for _ in 0..DIGITS {
        reversed = (reversed << 2) | (index & 3);
        index >>= 2;
    }
    reversed
}

fn digit_reverse(buf: &mut FftBuffer) {
    for k in 0..FFT_LEN {
        let r = reverse_digits(k);
        if r > k {
            buf.swap(2 * k, 2 * r);
            buf.swap(2 * k + 1, 2 * r + 1);
        }
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn digit_reversal_is_involution() {
        for k in 0..FFT_LEN {
            assert_eq!(reverse_digits(reverse_digits(k)), k);
        }
        assert_eq!(reverse_digits(1), 256);
        assert_eq!(reverse_digits(4), 64);
    }

    #[test]
    fn zero_in_zero_out() {
        let fft = Radix4Fft::new();
        let mut buf = [0i16; 2 * FFT_LEN];
        fft.process(&mut buf);
        assert!(buf.iter().all(|&v| v == 0));
    }

    #[test]
    fn dc_lands_in_bin_zero() {
        let fft = Radix4Fft::new();
        let mut buf = [0i16; 2 * FFT_LEN];
        for i in 0..FFT_LEN {
            buf[2 * i] = 8192;
        }
        fft.process(&mut buf);
        // 8192 * 1024 / 1024
        assert!((i32::from(buf[0]) - 8192).abs() <= 2);
        for k in 1..FFT_LEN {
            assert!(buf[2 * k].abs() <= 2 && buf[2 * k + 1].abs() <= 2, "leak at {k}");
        }
    }

    #[test]
    fn impulse_is_flat() {
        let fft = Radix4Fft::new();
        let mut buf = [0i16; 2 * FFT_LEN];
        buf[0] = i16::MAX;
        fft.process(&mut buf);
        // 32767 / 1024 ~ 32 in every bin
        for k in 0..FFT_LEN {
            assert!((i32::from(buf[2 * k]) - 32).abs() <= 1, "bin {k} = {}", buf[2 * k]);
            assert!(buf[2 * k + 1].abs() <= 1);
        }
    }

    #[test]
    fn matches_direct_dft() {
        let fft = Radix4Fft::new();
        let mut buf = [0i16; 2 * FFT_LEN];
        let signal: Vec<i16> = (0..FFT_LEN)
            .map(|n| (((n * 7919) % 16001) as i32 - 8000) as i16)
            .collect();
        for (n, &x) in signal.iter().enumerate() {
            buf[2 * n] = x;
        }
        fft.process(&mut buf);

        for k in [0usize, 1, 5, 100, 300, 511, 777] {
            let (mut re, mut im) = (0.0f64, 0.0f64);
            for (n, &x) in signal.iter().enumerate() {
                let angle = -core::f64::consts::TAU * (n * k) as f64 / FFT_LEN as f64;
                re += f64::from(x) * angle.cos();
                im += f64::from(x) * angle.sin();
            }
            re /= FFT_LEN as f64;
            im /= FFT_LEN as f64;
            assert!((f64::from(buf[2 * k]) - re).abs() < 6.0, "re bin {k}");
            assert!((f64::from(buf[2 * k + 1]) - im).abs() < 6.0, "im bin {k}");
        }
    }
}
