// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! Perceptual edge-activity masking for the block-frequency strategy.
//!
//! Pipeline: 3×3 Gaussian blur → Laplacian high-pass → |·| → min-max
//! normalization to [0,1]. Busy regions score near 1 and tolerate a larger
//! embedding gap; flat regions score near 0 and are disturbed as little as
//! the base strength allows. Borders are handled by clamping coordinates.

/// 3×3 Gaussian kernel (1 2 1 / 2 4 2 / 1 2 1, normalized by 16).
const GAUSS: [[f64; 3]; 3] = [
    [1.0 / 16.0, 2.0 / 16.0, 1.0 / 16.0],
    [2.0 / 16.0, 4.0 / 16.0, 2.0 / 16.0],
    [1.0 / 16.0, 2.0 / 16.0, 1.0 / 16.0],
];

/// 4-neighbor Laplacian kernel.
const LAPLACE: [[f64; 3]; 3] = [
    [0.0, 1.0, 0.0],
    [1.0, -4.0, 1.0],
    [0.0, 1.0, 0.0],
];

/// Compute the normalized edge-activity mask of a luma plane.
///
/// Returns one value in [0,1] per pixel. A perfectly flat plane (no
/// activity anywhere) yields all zeros.
pub fn edge_activity(plane: &[f64], width: usize, height: usize) -> Vec<f64> {
    let blurred = convolve3(plane, width, height, &GAUSS);
    let mut activity = convolve3(&blurred, width, height, &LAPLACE);
    for v in activity.iter_mut() {
        *v = v.abs();
    }

    let max = activity.iter().cloned().fold(0.0f64, f64::max);
    let min = activity.iter().cloned().fold(f64::INFINITY, f64::min);
    let range = max - min;
    if range <= f64::EPSILON {
        return vec![0.0; plane.len()];
    }
    for v in activity.iter_mut() {
        *v = (*v - min) / range;
    }
    activity
}

/// 3×3 convolution with clamped borders.
fn convolve3(plane: &[f64], width: usize, height: usize, kernel: &[[f64; 3]; 3]) -> Vec<f64> {
    let mut out = vec![0.0f64; plane.len()];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for (ky, krow) in kernel.iter().enumerate() {
                for (kx, &k) in krow.iter().enumerate() {
                    let sy = (y + ky).saturating_sub(1).min(height - 1);
                    let sx = (x + kx).saturating_sub(1).min(width - 1);
                    acc += k * plane[sy * width + sx];
                }
            }
            out[y * width + x] = acc;
        }
    }
    out
}
