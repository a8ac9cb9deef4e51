// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! 2D FFT/IFFT for synchronization-template embedding and detection.
//!
//! Radix-2 Cooley-Tukey for power-of-2 lengths, Bluestein's chirp-z
//! transform for everything else, so planes of arbitrary dimensions
//! transform without padding. Column passes gather into a single reusable
//! buffer; Bluestein chirp factors and FFT(b) are precomputed once per
//! (length, direction) and shared across all rows/columns of that length.

use num_complex::Complex;
use std::f64::consts::PI;

pub type Complex64 = Complex<f64>;

/// 2D complex spectrum in row-major order, DC at index 0 (unshifted).
pub struct Spectrum2D {
    pub data: Vec<Complex64>,
    pub width: usize,
    pub height: usize,
}

/// Precomputed Bluestein chirp factors and FFT(b) for one (n, direction).
struct BluesteinPlan {
    n: usize,
    m: usize, // next power of 2 >= 2n − 1
    chirp: Vec<Complex64>,
    b_hat: Vec<Complex64>,
}

impl BluesteinPlan {
    fn new(n: usize, sign: f64) -> Self {
        let m = (2 * n - 1).next_power_of_two();

        // w_k = exp(sign · iπ k²/n); k² taken mod 2n to keep the angle small.
        let mut chirp = vec![Complex64::new(0.0, 0.0); n];
        for (k, w) in chirp.iter_mut().enumerate() {
            let k_sq = (k * k) % (2 * n);
            let angle = sign * PI * k_sq as f64 / n as f64;
            *w = Complex64::new(angle.cos(), angle.sin());
        }

        // b_m = conj(chirp_m), mirrored for negative indices; the transform
        // is chirp_k · (x·chirp ⊛ b)_k.
        let mut b = vec![Complex64::new(0.0, 0.0); m];
        b[0] = chirp[0].conj();
        for k in 1..n {
            b[k] = chirp[k].conj();
            b[m - k] = chirp[k].conj();
        }
        fft_radix2(&mut b, -1.0);

        Self { n, m, chirp, b_hat: b }
    }

    fn execute(&self, input: &[Complex64]) -> Vec<Complex64> {
        debug_assert_eq!(input.len(), self.n);

        let mut a = vec![Complex64::new(0.0, 0.0); self.m];
        for k in 0..self.n {
            a[k] = input[k] * self.chirp[k];
        }

        // Circular convolution via forward/inverse radix-2 pair.
        fft_radix2(&mut a, -1.0);
        for (av, bv) in a.iter_mut().zip(self.b_hat.iter()) {
            *av = *av * *bv;
        }
        fft_radix2(&mut a, 1.0);

        let inv_m = 1.0 / self.m as f64;
        (0..self.n)
            .map(|k| a[k] * inv_m * self.chirp[k])
            .collect()
    }
}

/// In-place radix-2 Cooley-Tukey. `data.len()` must be a power of 2;
/// `sign` is −1 for the forward transform, +1 for the inverse
/// (unnormalized).
fn fft_radix2(data: &mut [Complex64], sign: f64) {
    let n = data.len();
    debug_assert!(n.is_power_of_two());
    if n <= 1 {
        return;
    }

    // Bit-reversal permutation.
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            data.swap(i, j);
        }
    }

    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let angle_step = sign * PI / half as f64;
        for start in (0..n).step_by(len) {
            for k in 0..half {
                let angle = angle_step * k as f64;
                let w = Complex64::new(angle.cos(), angle.sin());
                let u = data[start + k];
                let v = data[start + k + half] * w;
                data[start + k] = u + v;
                data[start + k + half] = u - v;
            }
        }
        len <<= 1;
    }
}

/// 1D transform of arbitrary length, dispatching to radix-2 or Bluestein.
fn fft1d(input: &[Complex64], sign: f64, plan: Option<&BluesteinPlan>) -> Vec<Complex64> {
    let n = input.len();
    if n <= 1 {
        return input.to_vec();
    }
    if n.is_power_of_two() {
        let mut buf = input.to_vec();
        fft_radix2(&mut buf, sign);
        return buf;
    }
    match plan {
        Some(p) => p.execute(input),
        None => BluesteinPlan::new(n, sign).execute(input),
    }
}

/// Real-valued plane → 2D complex spectrum.
pub fn fft2d(pixels: &[f64], width: usize, height: usize) -> Spectrum2D {
    assert_eq!(pixels.len(), width * height);

    let mut data: Vec<Complex64> = pixels.iter().map(|&v| Complex64::new(v, 0.0)).collect();

    let row_plan = (!width.is_power_of_two() && width > 1).then(|| BluesteinPlan::new(width, -1.0));
    let col_plan =
        (!height.is_power_of_two() && height > 1).then(|| BluesteinPlan::new(height, -1.0));

    for row in 0..height {
        let start = row * width;
        let transformed = fft1d(&data[start..start + width], -1.0, row_plan.as_ref());
        data[start..start + width].copy_from_slice(&transformed);
    }

    let mut col_buf = vec![Complex64::new(0.0, 0.0); height];
    for col in 0..width {
        for r in 0..height {
            col_buf[r] = data[r * width + col];
        }
        let transformed = fft1d(&col_buf, -1.0, col_plan.as_ref());
        for r in 0..height {
            data[r * width + col] = transformed[r];
        }
    }

    Spectrum2D { data, width, height }
}

/// 2D spectrum → real-valued plane (real parts, normalized by 1/(w·h)).
pub fn ifft2d(spectrum: &Spectrum2D) -> Vec<f64> {
    let width = spectrum.width;
    let height = spectrum.height;
    let mut data = spectrum.data.clone();

    let row_plan = (!width.is_power_of_two() && width > 1).then(|| BluesteinPlan::new(width, 1.0));
    let col_plan =
        (!height.is_power_of_two() && height > 1).then(|| BluesteinPlan::new(height, 1.0));

    for row in 0..height {
        let start = row * width;
        let transformed = fft1d(&data[start..start + width], 1.0, row_plan.as_ref());
        data[start..start + width].copy_from_slice(&transformed);
    }

    let mut col_buf = vec![Complex64::new(0.0, 0.0); height];
    for col in 0..width {
        for r in 0..height {
            col_buf[r] = data[r * width + col];
        }
        let transformed = fft1d(&col_buf, 1.0, col_plan.as_ref());
        for r in 0..height {
            data[r * width + col] = transformed[r];
        }
    }

    let norm = 1.0 / (width * height) as f64;
    data.iter().map(|c| c.re * norm).collect()
}

/// Centered (fftshifted) magnitude spectrum: DC lands at
/// `(width/2, height/2)`, so rotation and scaling of the image act about
/// the array center. Used by template detection only.
pub fn shifted_magnitude(spectrum: &Spectrum2D) -> Vec<f64> {
    let w = spectrum.width;
    let h = spectrum.height;
    let mut out = vec![0.0f64; w * h];
    for y in 0..h {
        for x in 0..w {
            let sx = (x + w / 2) % w;
            let sy = (y + h / 2) % h;
            out[sy * w + sx] = spectrum.data[y * w + x].norm();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fft_ifft_roundtrip_pow2() {
        let (w, h) = (16, 16);
        let pixels: Vec<f64> = (0..w * h).map(|i| (i as f64) * 0.1 + 50.0).collect();
        let recovered = ifft2d(&fft2d(&pixels, w, h));
        for (a, b) in pixels.iter().zip(recovered.iter()) {
            assert!((a - b).abs() < 1e-9, "{a} vs {b}");
        }
    }

    #[test]
    fn fft_ifft_roundtrip_arbitrary_dims() {
        let (w, h) = (12, 10);
        let pixels: Vec<f64> = (0..w * h).map(|i| (i as f64) * 0.3 + 20.0).collect();
        let recovered = ifft2d(&fft2d(&pixels, w, h));
        for (a, b) in pixels.iter().zip(recovered.iter()) {
            assert!((a - b).abs() < 1e-8, "{a} vs {b}");
        }
    }

    #[test]
    fn dc_component_is_sum() {
        let (w, h) = (4, 4);
        let pixels: Vec<f64> = (1..=16).map(|i| i as f64).collect();
        let spectrum = fft2d(&pixels, w, h);
        let expected: f64 = pixels.iter().sum();
        assert!((spectrum.data[0].re - expected).abs() < 1e-9);
        assert!(spectrum.data[0].im.abs() < 1e-9);
    }

    #[test]
    fn parseval_theorem() {
        let (w, h) = (8, 8);
        let pixels: Vec<f64> = (0..w * h).map(|i| ((i * 7 + 3) % 256) as f64).collect();
        let spatial: f64 = pixels.iter().map(|v| v * v).sum();
        let spectrum = fft2d(&pixels, w, h);
        let freq: f64 = spectrum.data.iter().map(|c| c.norm_sqr()).sum();
        assert!((spatial - freq / (w * h) as f64).abs() < 1e-6);
    }

    #[test]
    fn bluestein_matches_direct_dft() {
        let n = 7;
        let input: Vec<Complex64> = (0..n)
            .map(|i| Complex64::new((i * 3 + 1) as f64, (i * 2) as f64))
            .collect();
        let plan = BluesteinPlan::new(n, -1.0);
        let fast = plan.execute(&input);

        for k in 0..n {
            let mut direct = Complex64::new(0.0, 0.0);
            for (j, &x) in input.iter().enumerate() {
                let angle = -2.0 * PI * (k * j) as f64 / n as f64;
                direct += x * Complex64::new(angle.cos(), angle.sin());
            }
            assert!(
                (fast[k] - direct).norm() < 1e-8,
                "mismatch at {k}: {} vs {direct}",
                fast[k]
            );
        }
    }

    #[test]
    fn shifted_magnitude_centers_dc() {
        let (w, h) = (8, 6);
        let pixels = vec![10.0f64; w * h];
        let spectrum = fft2d(&pixels, w, h);
        let mag = shifted_magnitude(&spectrum);

        let center = (h / 2) * w + w / 2;
        assert!((mag[center] - (10.0 * (w * h) as f64)).abs() < 1e-9);
        // Everything else is zero for a flat plane.
        for (i, &m) in mag.iter().enumerate() {
            if i != center {
                assert!(m < 1e-9, "unexpected energy at {i}: {m}");
            }
        }
    }
}
