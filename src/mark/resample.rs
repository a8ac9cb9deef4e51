// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! Plane resampling for geometric transforms.
//!
//! [`warp_affine`] applies a rotation+scale about the plane center. The
//! inverse mapping is folded into a single 2×2 matrix, and because the map
//! is affine, each output row walks the source plane in constant steps —
//! one matrix column per output column. Undoing a detected transform
//! (θ, s) is the same call with (−θ, 1/s). [`resize_plane`] is the
//! axis-aligned special case used to realign a suspect image to a
//! reference image's dimensions.

/// Value read for source coordinates outside the plane (mid-gray).
const OUTSIDE: f64 = 128.0;

/// A rotation+scale about the image center. Positive rotation turns the
/// content counter-clockwise in array coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub rotation_rad: f64,
    pub scale: f64,
}

impl AffineTransform {
    /// The transform that undoes this one.
    pub fn inverse(&self) -> Self {
        let scale = if self.scale.abs() > 1e-12 { 1.0 / self.scale } else { 1.0 };
        Self {
            rotation_rad: -self.rotation_rad,
            scale,
        }
    }

    /// Rows of the inverse 2×2 map (rotate by −θ, then divide by s):
    /// `src_offset = M · dst_offset`.
    fn inverse_matrix(&self) -> [[f64; 2]; 2] {
        let (sin, cos) = self.rotation_rad.sin_cos();
        let k = if self.scale.abs() > 1e-12 { 1.0 / self.scale } else { 1.0 };
        [[cos * k, sin * k], [-sin * k, cos * k]]
    }
}

/// Apply `transform` to a plane. Out-of-bounds source pixels read as
/// mid-gray.
pub fn warp_affine(
    pixels: &[f64],
    src_w: usize,
    src_h: usize,
    transform: &AffineTransform,
    dst_w: usize,
    dst_h: usize,
) -> Vec<f64> {
    let [[m00, m01], [m10, m11]] = transform.inverse_matrix();
    let center = |n: usize| n as f64 / 2.0;

    let mut out = Vec::with_capacity(dst_w * dst_h);
    for row in 0..dst_h {
        let dy = row as f64 - center(dst_h);
        let dx0 = -center(dst_w);
        // Row start in source coordinates; each column adds the matrix's
        // first column.
        let mut sx = m00 * dx0 + m01 * dy + center(src_w);
        let mut sy = m10 * dx0 + m11 * dy + center(src_h);
        for _ in 0..dst_w {
            out.push(sample(pixels, src_w, src_h, sx, sy));
            sx += m00;
            sy += m10;
        }
    }
    out
}

/// Resize a plane to new dimensions (axis-aligned bilinear).
pub fn resize_plane(
    pixels: &[f64],
    src_w: usize,
    src_h: usize,
    dst_w: usize,
    dst_h: usize,
) -> Vec<f64> {
    if src_w == dst_w && src_h == dst_h {
        return pixels.to_vec();
    }
    let x_ratio = src_w as f64 / dst_w as f64;
    let y_ratio = src_h as f64 / dst_h as f64;

    let mut out = Vec::with_capacity(dst_w * dst_h);
    for row in 0..dst_h {
        // Sample at pixel centers so edges map to edges; clamp instead of
        // gray-filling — a resize has no "outside".
        let sy = ((row as f64 + 0.5) * y_ratio - 0.5).clamp(0.0, (src_h - 1) as f64);
        for col in 0..dst_w {
            let sx = ((col as f64 + 0.5) * x_ratio - 0.5).clamp(0.0, (src_w - 1) as f64);
            out.push(sample(pixels, src_w, src_h, sx, sy));
        }
    }
    out
}

/// Bilinear interpolation as two horizontal lerps followed by a vertical
/// one. Taps outside the plane read [`OUTSIDE`].
fn sample(pixels: &[f64], w: usize, h: usize, x: f64, y: f64) -> f64 {
    let bx = x.floor();
    let by = y.floor();
    let tx = x - bx;
    let ty = y - by;

    let tap = |dx: i64, dy: i64| -> f64 {
        let px = bx as i64 + dx;
        let py = by as i64 + dy;
        if (0..w as i64).contains(&px) && (0..h as i64).contains(&py) {
            pixels[py as usize * w + px as usize]
        } else {
            OUTSIDE
        }
    };

    let upper = {
        let a = tap(0, 0);
        a + tx * (tap(1, 0) - a)
    };
    let lower = {
        let a = tap(0, 1);
        a + tx * (tap(1, 1) - a)
    };
    upper + ty * (lower - upper)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_transform_preserves_interior() {
        let (w, h) = (16, 16);
        let pixels: Vec<f64> = (0..w * h).map(|i| (i as f64) * 1.5 + 10.0).collect();

        let identity = AffineTransform { rotation_rad: 0.0, scale: 1.0 };
        let result = warp_affine(&pixels, w, h, &identity, w, h);

        for y in 1..h - 1 {
            for x in 1..w - 1 {
                let idx = y * w + x;
                assert!(
                    (pixels[idx] - result[idx]).abs() < 0.01,
                    "mismatch at ({x},{y}): {} vs {}",
                    pixels[idx],
                    result[idx]
                );
            }
        }
    }

    #[test]
    fn rotation_roundtrips_through_inverse() {
        let (w, h) = (32, 32);
        let pixels: Vec<f64> = (0..w * h).map(|i| (i % 7) as f64 * 30.0 + 50.0).collect();

        let fwd = AffineTransform { rotation_rad: 10.0f64.to_radians(), scale: 1.0 };
        let rotated = warp_affine(&pixels, w, h, &fwd, w, h);
        let restored = warp_affine(&rotated, w, h, &fwd.inverse(), w, h);

        // Center region should come back; borders lose data to the gray fill.
        for y in 8..h - 8 {
            for x in 8..w - 8 {
                let idx = y * w + x;
                assert!(
                    (pixels[idx] - restored[idx]).abs() < 25.0,
                    "large mismatch at ({x},{y}): {} vs {}",
                    pixels[idx],
                    restored[idx]
                );
            }
        }
    }

    #[test]
    fn inverse_of_inverse_is_original() {
        let t = AffineTransform { rotation_rad: 0.3, scale: 0.8 };
        let back = t.inverse().inverse();
        assert!((back.rotation_rad - t.rotation_rad).abs() < 1e-12);
        assert!((back.scale - t.scale).abs() < 1e-12);
    }

    #[test]
    fn pure_scale_maps_center_row_linearly() {
        // Zoom 2× on a horizontal ramp: the center row must read the ramp
        // at half speed around the midpoint.
        let (w, h) = (16, 16);
        let pixels: Vec<f64> = (0..w * h).map(|i| (i % w) as f64 * 10.0).collect();

        let zoom = AffineTransform { rotation_rad: 0.0, scale: 2.0 };
        let result = warp_affine(&pixels, w, h, &zoom, w, h);

        let mid = h / 2;
        for x in 4..w - 4 {
            let expected = ((x as f64 - 8.0) * 0.5 + 8.0) * 10.0;
            let got = result[mid * w + x];
            assert!(
                (got - expected).abs() < 1.0,
                "at x={x}: expected {expected}, got {got}"
            );
        }
    }

    #[test]
    fn resize_preserves_flat_plane() {
        let plane = vec![99.0f64; 20 * 10];
        let resized = resize_plane(&plane, 20, 10, 13, 27);
        assert_eq!(resized.len(), 13 * 27);
        for v in resized {
            assert!((v - 99.0).abs() < 1e-9);
        }
    }

    #[test]
    fn resize_to_same_size_is_exact_copy() {
        let plane: Vec<f64> = (0..48).map(|i| i as f64).collect();
        assert_eq!(resize_plane(&plane, 8, 6, 8, 6), plane);
    }

    #[test]
    fn downscale_then_upscale_approximates_smooth_plane() {
        let (w, h) = (32, 32);
        let plane: Vec<f64> = (0..w * h)
            .map(|i| 100.0 + 30.0 * (((i % w) as f64) * 0.1).sin())
            .collect();
        let small = resize_plane(&plane, w, h, 16, 16);
        let back = resize_plane(&small, 16, 16, w, h);
        for y in 2..h - 2 {
            for x in 2..w - 2 {
                let idx = y * w + x;
                assert!(
                    (plane[idx] - back[idx]).abs() < 5.0,
                    "mismatch at ({x},{y}): {} vs {}",
                    plane[idx],
                    back[idx]
                );
            }
        }
    }
}
