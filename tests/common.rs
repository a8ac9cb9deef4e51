// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! Shared helpers for integration tests: synthetic cover images and
//! full-color geometric attacks.

#![allow(dead_code)]

use lumamark::mark::resample::{warp_affine, AffineTransform};
use lumamark::PixelBuffer;

/// Deterministic photo-like cover: smooth gradients + texture + grain.
pub fn cover_image(width: usize, height: usize) -> PixelBuffer {
    let mut data = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            let fx = x as f64;
            let fy = y as f64;
            let luma = 115.0
                + 50.0 * (fx * 0.051).sin() * (fy * 0.043).cos()
                + 22.0 * (fx * 0.013 + fy * 0.021).sin();
            let grain = (((y * width + x) as u64).wrapping_mul(2_654_435_761) >> 16) % 19;
            let v = (luma + grain as f64).clamp(0.0, 235.0);
            data.push((v * 0.9) as u8); // B
            data.push(v as u8); // G
            data.push((v * 1.05).min(255.0) as u8); // R
        }
    }
    PixelBuffer::from_raw(data, width, height).unwrap()
}

/// Apply a rotation+scale attack to a full-color image, keeping the canvas
/// size (out-of-bounds regions fill with gray, as a real attacker's editor
/// would leave some background).
pub fn attack_geometry(image: &PixelBuffer, rotation_deg: f64, scale: f64) -> PixelBuffer {
    let transform = AffineTransform {
        rotation_rad: rotation_deg.to_radians(),
        scale,
    };
    let mut planes = image.to_ycbcr();
    let (w, h) = (planes.width, planes.height);
    planes.y = warp_affine(&planes.y, w, h, &transform, w, h);
    planes.cb = warp_affine(&planes.cb, w, h, &transform, w, h);
    planes.cr = warp_affine(&planes.cr, w, h, &transform, w, h);
    planes.to_buffer()
}

/// Resize a full-color image to new dimensions.
pub fn resize_image(image: &PixelBuffer, dst_w: usize, dst_h: usize) -> PixelBuffer {
    use lumamark::mark::resample::resize_plane;
    let planes = image.to_ycbcr();
    let (w, h) = (planes.width, planes.height);
    let resized = lumamark::pixel::YcbcrPlanes {
        y: resize_plane(&planes.y, w, h, dst_w, dst_h),
        cb: resize_plane(&planes.cb, w, h, dst_w, dst_h),
        cr: resize_plane(&planes.cr, w, h, dst_w, dst_h),
        width: dst_w,
        height: dst_h,
    };
    resized.to_buffer()
}
