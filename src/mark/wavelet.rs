// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! Single-level 2D Haar wavelet decomposition.
//!
//! Orthonormal Haar pair: s = (a+b)/√2, d = (a−b)/√2, applied separably
//! (rows, then columns) to produce four subbands — LL (approximation) and
//! LH/HL/HH (detail). Odd-length edges are extended by duplicating the last
//! sample, so subband dimensions are `ceil(n/2)` and the inverse transform
//! restores the exact original shape by cropping the reconstruction.
//! The exact-shape guarantee matters: the embedder recombines the
//! reconstructed luma plane with untouched chroma planes of the original
//! size.

use std::f64::consts::SQRT_2;

/// One level of 2D decomposition. Subbands are row-major, all with the same
/// dimensions `ceil(width/2) × ceil(height/2)`.
pub struct Subbands {
    pub ll: Vec<f64>,
    pub lh: Vec<f64>,
    pub hl: Vec<f64>,
    pub hh: Vec<f64>,
    /// Subband width (`ceil(orig_width / 2)`).
    pub sub_w: usize,
    /// Subband height (`ceil(orig_height / 2)`).
    pub sub_h: usize,
    orig_w: usize,
    orig_h: usize,
}

/// Forward single-level Haar DWT of a row-major plane.
pub fn forward(plane: &[f64], width: usize, height: usize) -> Subbands {
    assert_eq!(plane.len(), width * height);
    let sub_w = width.div_ceil(2);
    let sub_h = height.div_ceil(2);

    // Pass 1: rows → low | high halves.
    let mut row_lo = vec![0.0f64; sub_w * height];
    let mut row_hi = vec![0.0f64; sub_w * height];
    for y in 0..height {
        let row = &plane[y * width..(y + 1) * width];
        for i in 0..sub_w {
            let a = row[2 * i];
            let b = row[(2 * i + 1).min(width - 1)];
            row_lo[y * sub_w + i] = (a + b) / SQRT_2;
            row_hi[y * sub_w + i] = (a - b) / SQRT_2;
        }
    }

    // Pass 2: columns of each half → four subbands.
    let mut ll = vec![0.0f64; sub_w * sub_h];
    let mut lh = vec![0.0f64; sub_w * sub_h];
    let mut hl = vec![0.0f64; sub_w * sub_h];
    let mut hh = vec![0.0f64; sub_w * sub_h];
    for x in 0..sub_w {
        for j in 0..sub_h {
            let top = 2 * j;
            let bot = (2 * j + 1).min(height - 1);

            let a = row_lo[top * sub_w + x];
            let b = row_lo[bot * sub_w + x];
            ll[j * sub_w + x] = (a + b) / SQRT_2;
            lh[j * sub_w + x] = (a - b) / SQRT_2;

            let a = row_hi[top * sub_w + x];
            let b = row_hi[bot * sub_w + x];
            hl[j * sub_w + x] = (a + b) / SQRT_2;
            hh[j * sub_w + x] = (a - b) / SQRT_2;
        }
    }

    Subbands {
        ll,
        lh,
        hl,
        hh,
        sub_w,
        sub_h,
        orig_w: width,
        orig_h: height,
    }
}

/// Inverse single-level Haar DWT. The reconstruction is computed on the
/// even-sized extended grid and then cropped to the exact original
/// dimensions recorded at decomposition time.
pub fn inverse(bands: &Subbands) -> Vec<f64> {
    let sub_w = bands.sub_w;
    let sub_h = bands.sub_h;
    let ext_h = sub_h * 2;

    // Pass 1: undo the column transform of both halves.
    let mut row_lo = vec![0.0f64; sub_w * ext_h];
    let mut row_hi = vec![0.0f64; sub_w * ext_h];
    for x in 0..sub_w {
        for j in 0..sub_h {
            let s = bands.ll[j * sub_w + x];
            let d = bands.lh[j * sub_w + x];
            row_lo[(2 * j) * sub_w + x] = (s + d) / SQRT_2;
            row_lo[(2 * j + 1) * sub_w + x] = (s - d) / SQRT_2;

            let s = bands.hl[j * sub_w + x];
            let d = bands.hh[j * sub_w + x];
            row_hi[(2 * j) * sub_w + x] = (s + d) / SQRT_2;
            row_hi[(2 * j + 1) * sub_w + x] = (s - d) / SQRT_2;
        }
    }

    // Pass 2: undo the row transform, cropping to the original shape.
    let mut plane = vec![0.0f64; bands.orig_w * bands.orig_h];
    for y in 0..bands.orig_h {
        for i in 0..sub_w {
            let s = row_lo[y * sub_w + i];
            let d = row_hi[y * sub_w + i];
            let a = (s + d) / SQRT_2;
            let b = (s - d) / SQRT_2;
            let x0 = 2 * i;
            plane[y * bands.orig_w + x0] = a;
            if x0 + 1 < bands.orig_w {
                plane[y * bands.orig_w + x0 + 1] = b;
            }
        }
    }
    plane
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_plane(w: usize, h: usize) -> Vec<f64> {
        (0..w * h)
            .map(|i| {
                let x = (i % w) as f64;
                let y = (i / w) as f64;
                128.0 + 40.0 * (x * 0.2).sin() + 25.0 * (y * 0.15).cos()
            })
            .collect()
    }

    #[test]
    fn roundtrip_even_dims() {
        let (w, h) = (16, 12);
        let plane = test_plane(w, h);
        let bands = forward(&plane, w, h);
        assert_eq!(bands.sub_w, 8);
        assert_eq!(bands.sub_h, 6);

        let back = inverse(&bands);
        assert_eq!(back.len(), plane.len());
        for (a, b) in plane.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-10, "{a} vs {b}");
        }
    }

    #[test]
    fn roundtrip_odd_dims_exact_shape() {
        for (w, h) in [(15, 9), (17, 16), (16, 11), (7, 7)] {
            let plane = test_plane(w, h);
            let bands = forward(&plane, w, h);
            assert_eq!(bands.sub_w, w.div_ceil(2));
            assert_eq!(bands.sub_h, h.div_ceil(2));

            let back = inverse(&bands);
            assert_eq!(back.len(), w * h, "shape must match exactly for {w}x{h}");
            for (i, (a, b)) in plane.iter().zip(back.iter()).enumerate() {
                assert!((a - b).abs() < 1e-9, "{w}x{h} mismatch at {i}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn flat_plane_has_zero_detail() {
        let (w, h) = (8, 8);
        let plane = vec![100.0; w * h];
        let bands = forward(&plane, w, h);
        assert!(bands.lh.iter().all(|&d| d.abs() < 1e-12));
        assert!(bands.hl.iter().all(|&d| d.abs() < 1e-12));
        assert!(bands.hh.iter().all(|&d| d.abs() < 1e-12));
        // Orthonormal Haar: LL of a flat plane is 2× the sample value.
        assert!(bands.ll.iter().all(|&s| (s - 200.0).abs() < 1e-12));
    }

    #[test]
    fn modified_ll_survives_roundtrip() {
        // The embedding contract: write a value into LL, reconstruct, and
        // the forward transform of the reconstruction reads it back.
        let (w, h) = (32, 32);
        let plane = test_plane(w, h);
        let mut bands = forward(&plane, w, h);
        bands.ll[5] = 170.0;
        bands.ll[100] = -30.0;

        let back = inverse(&bands);
        let reread = forward(&back, w, h);
        assert!((reread.ll[5] - 170.0).abs() < 1e-9);
        assert!((reread.ll[100] + 30.0).abs() < 1e-9);
    }
}
