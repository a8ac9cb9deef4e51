// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! Block-frequency embedding (secondary strategy).
//!
//! Scans the luma plane in non-overlapping 8×8 blocks, row-major, skipping
//! any incomplete trailing block row/column. Each block carries one bit in
//! the order relation of two mid-frequency DCT coefficients: bit 1 forces
//! `c1 > c2 + gap`, bit 0 forces `c2 > c1 + gap`, with the gap derived from
//! the base strength plus the local perceptual mask. Extraction recomputes
//! the transform per block and compares the same pair.

use std::f64::consts::PI;
use std::sync::OnceLock;

use tracing::debug;

use crate::mark::error::WatermarkError;
use crate::mark::mask;

/// Block edge length.
pub const BLOCK: usize = 8;

/// Mid-frequency coefficient pair, (row, col) in the 8×8 DCT grid.
/// The same pair is read back at extraction.
const C1: (usize, usize) = (3, 1);
const C2: (usize, usize) = (1, 3);

/// Gap component independent of local activity.
const BASE_GAP: f64 = 2.0;

/// Gap gain applied to the [0,1] mask value.
const MASK_GAIN: f64 = 5.0;

/// Pre-computed cosine table: `COSINE[u][x] = cos((2x+1)·u·π/16)`.
static COSINE: OnceLock<[[f64; BLOCK]; BLOCK]> = OnceLock::new();

/// Normalization constants: C(0) = 1/√8, C(u>0) = 1/2.
static NORM: OnceLock<[f64; BLOCK]> = OnceLock::new();

fn cosine_table() -> &'static [[f64; BLOCK]; BLOCK] {
    COSINE.get_or_init(|| {
        let mut table = [[0.0f64; BLOCK]; BLOCK];
        for (u, row) in table.iter_mut().enumerate() {
            for (x, v) in row.iter_mut().enumerate() {
                *v = ((2 * x + 1) as f64 * u as f64 * PI / 16.0).cos();
            }
        }
        table
    })
}

fn norm_table() -> &'static [f64; BLOCK] {
    NORM.get_or_init(|| {
        let mut n = [0.5f64; BLOCK];
        n[0] = 1.0 / (BLOCK as f64).sqrt();
        n
    })
}

/// 8×8 orthonormal forward DCT.
pub fn dct_block(pixels: &[f64; 64]) -> [f64; 64] {
    let cos = cosine_table();
    let c = norm_table();

    // Separable: rows then columns.
    let mut temp = [0.0f64; 64];
    for row in 0..BLOCK {
        for u in 0..BLOCK {
            let mut sum = 0.0;
            for x in 0..BLOCK {
                sum += pixels[row * BLOCK + x] * cos[u][x];
            }
            temp[row * BLOCK + u] = c[u] * sum;
        }
    }

    let mut coeffs = [0.0f64; 64];
    for col in 0..BLOCK {
        for v in 0..BLOCK {
            let mut sum = 0.0;
            for y in 0..BLOCK {
                sum += temp[y * BLOCK + col] * cos[v][y];
            }
            coeffs[v * BLOCK + col] = c[v] * sum;
        }
    }
    coeffs
}

/// 8×8 orthonormal inverse DCT.
pub fn idct_block(coeffs: &[f64; 64]) -> [f64; 64] {
    let cos = cosine_table();
    let c = norm_table();

    // Separable: columns then rows.
    let mut temp = [0.0f64; 64];
    for col in 0..BLOCK {
        for y in 0..BLOCK {
            let mut sum = 0.0;
            for v in 0..BLOCK {
                sum += c[v] * coeffs[v * BLOCK + col] * cos[v][y];
            }
            temp[y * BLOCK + col] = sum;
        }
    }

    let mut pixels = [0.0f64; 64];
    for row in 0..BLOCK {
        for x in 0..BLOCK {
            let mut sum = 0.0;
            for u in 0..BLOCK {
                sum += c[u] * temp[row * BLOCK + u] * cos[u][x];
            }
            pixels[row * BLOCK + x] = sum;
        }
    }
    pixels
}

/// Number of bit-carrying blocks in a plane of the given size.
pub fn capacity(width: usize, height: usize) -> usize {
    (width / BLOCK) * (height / BLOCK)
}

/// Embed `bits` into the luma plane, one bit per full 8×8 block.
///
/// # Errors
/// [`WatermarkError::InsufficientCapacity`] when the plane holds fewer full
/// blocks than `bits.len()`. Checked before any block is modified.
pub fn embed(
    plane: &[f64],
    width: usize,
    height: usize,
    bits: &[u8],
    strength: f64,
) -> Result<Vec<f64>, WatermarkError> {
    let blocks = capacity(width, height);
    if bits.len() > blocks {
        return Err(WatermarkError::InsufficientCapacity {
            needed: bits.len(),
            available: blocks,
        });
    }

    let activity = mask::edge_activity(plane, width, height);
    debug!(
        bits = bits.len(),
        blocks,
        strength,
        "block-frequency embedding"
    );

    let mut out = plane.to_vec();
    let mut bit_idx = 0usize;

    'rows: for by in 0..height / BLOCK {
        for bx in 0..width / BLOCK {
            if bit_idx >= bits.len() {
                break 'rows;
            }

            let mut block = [0.0f64; 64];
            read_block(&out, width, bx, by, &mut block);
            let mut coeffs = dct_block(&block);

            // Mask sampled at the block center.
            let cy = by * BLOCK + BLOCK / 2;
            let cx = bx * BLOCK + BLOCK / 2;
            let local = activity[cy * width + cx];
            let gap = strength * (BASE_GAP + MASK_GAIN * local);

            let c1 = coeffs[C1.0 * BLOCK + C1.1];
            let c2 = coeffs[C2.0 * BLOCK + C2.1];
            if bits[bit_idx] == 1 {
                if c1 <= c2 + gap {
                    let diff = (c2 + gap - c1) / 2.0;
                    coeffs[C1.0 * BLOCK + C1.1] += diff;
                    coeffs[C2.0 * BLOCK + C2.1] -= diff;
                }
            } else if c2 <= c1 + gap {
                let diff = (c1 + gap - c2) / 2.0;
                coeffs[C2.0 * BLOCK + C2.1] += diff;
                coeffs[C1.0 * BLOCK + C1.1] -= diff;
            }

            let pixels = idct_block(&coeffs);
            write_block(&mut out, width, bx, by, &pixels);
            bit_idx += 1;
        }
    }

    Ok(out)
}

/// Extract up to `count` bits by comparing the coefficient pair in each
/// full block, in embedding order.
pub fn extract(plane: &[f64], width: usize, height: usize, count: usize) -> Vec<u8> {
    let mut bits = Vec::with_capacity(count.min(capacity(width, height)));

    'rows: for by in 0..height / BLOCK {
        for bx in 0..width / BLOCK {
            if bits.len() >= count {
                break 'rows;
            }
            let mut block = [0.0f64; 64];
            read_block(plane, width, bx, by, &mut block);
            let coeffs = dct_block(&block);

            let c1 = coeffs[C1.0 * BLOCK + C1.1];
            let c2 = coeffs[C2.0 * BLOCK + C2.1];
            bits.push(u8::from(c1 > c2));
        }
    }
    bits
}

fn read_block(plane: &[f64], width: usize, bx: usize, by: usize, block: &mut [f64; 64]) {
    for row in 0..BLOCK {
        let src = (by * BLOCK + row) * width + bx * BLOCK;
        block[row * BLOCK..(row + 1) * BLOCK].copy_from_slice(&plane[src..src + BLOCK]);
    }
}

fn write_block(plane: &mut [f64], width: usize, bx: usize, by: usize, block: &[f64; 64]) {
    for row in 0..BLOCK {
        let dst = (by * BLOCK + row) * width + bx * BLOCK;
        plane[dst..dst + BLOCK].copy_from_slice(&block[row * BLOCK..(row + 1) * BLOCK]);
    }
}
