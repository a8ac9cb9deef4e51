// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! Wavelet-domain QIM embedding (primary strategy).
//!
//! One bit per LL coefficient: quantize the coefficient to the configured
//! step and force the parity of the quantizer index to match the bit —
//! even for 0, odd for 1. Extraction re-quantizes and reads the parity
//! back. Bits are placed sequentially from the start of the row-major LL
//! scan, which concentrates the packet in one region; combined with the
//! Reed-Solomon parity this is the crop-resistance trade-off of the layout.
//!
//! Both sides must use the same quantization step, wavelet kind, and scan
//! order — all carried by the shared `AlgorithmConfig`.

use tracing::debug;

use crate::mark::error::WatermarkError;
use crate::mark::wavelet;

/// Embed `bits` into the luma plane, returning the watermarked plane with
/// the exact same dimensions.
///
/// # Errors
/// [`WatermarkError::InsufficientCapacity`] when the LL subband holds fewer
/// coefficients than `bits.len()`. Checked before any coefficient is
/// touched.
pub fn embed(
    plane: &[f64],
    width: usize,
    height: usize,
    bits: &[u8],
    delta: f64,
) -> Result<Vec<f64>, WatermarkError> {
    let mut bands = wavelet::forward(plane, width, height);

    if bits.len() > bands.ll.len() {
        return Err(WatermarkError::InsufficientCapacity {
            needed: bits.len(),
            available: bands.ll.len(),
        });
    }

    debug!(
        bits = bits.len(),
        ll_w = bands.sub_w,
        ll_h = bands.sub_h,
        delta,
        "QIM embedding into LL subband"
    );

    for (coeff, &bit) in bands.ll.iter_mut().zip(bits.iter()) {
        *coeff = quantize_to_parity(*coeff, delta, bit);
    }

    Ok(wavelet::inverse(&bands))
}

/// Extract up to `count` bits from the leading LL coefficients, in the same
/// scan order the embedder used. Returns fewer bits when the subband is
/// smaller than `count` (the payload decoder reports that as insufficient
/// data).
pub fn extract(plane: &[f64], width: usize, height: usize, count: usize, delta: f64) -> Vec<u8> {
    let bands = wavelet::forward(plane, width, height);
    bands
        .ll
        .iter()
        .take(count)
        .map(|&c| read_parity(c, delta))
        .collect()
}

/// Snap a coefficient to the nearest quantizer index of the required
/// parity: `q = round(c/Δ)`, nudged by ±1 when the parity disagrees.
fn quantize_to_parity(c: f64, delta: f64, bit: u8) -> f64 {
    let mut q = (c / delta).round() as i64;
    if q.rem_euclid(2) as u8 != bit {
        // Fixed nudge direction per bit value; both sides share it.
        if bit == 0 {
            q -= 1;
        } else {
            q += 1;
        }
    }
    q as f64 * delta
}

/// Recover the embedded bit from a coefficient's quantizer parity.
fn read_parity(c: f64, delta: f64) -> u8 {
    ((c / delta).round() as i64).rem_euclid(2) as u8
}
