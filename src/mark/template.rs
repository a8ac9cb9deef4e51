// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! Synchronization template: embedding, detection, transform estimation.
//!
//! The template is K=32 peaks at fixed pseudo-random positions in the
//! mid-frequency annulus of the DFT magnitude spectrum. Peak positions are
//! generated once per process from a fixed seed and stored in normalized
//! polar form, so the same calibration pattern applies to any image size.
//! Rotating or scaling the image rotates/scales the peak constellation in
//! the centered spectrum; the detector searches a grid of candidate
//! (rotation, scale) pairs for the one whose transformed constellation
//! lights up, and the strategies undo the winning transform before bit
//! extraction.

use std::sync::OnceLock;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::debug;

use crate::mark::fft2d::{self, Complex64};

/// Number of template peaks.
const K: usize = 32;

/// Fixed generation seed — calibration data, not a secret.
const TEMPLATE_SEED: [u8; 32] = *b"lumamark-synchronization-seed-01";

/// Peak amplitude relative to the local spectrum level.
const PEAK_GAIN: f64 = 2.5;

/// Annulus bounds as fractions of the minimum image dimension.
const R_MIN_FRAC: f64 = 0.05;
const R_MAX_FRAC: f64 = 0.25;

/// Candidate grid: rotation ±12° in 1° steps, scale 0.80–1.25 in 0.05 steps.
const ROT_RANGE_DEG: i32 = 12;
const SCALE_STEPS: [f64; 10] = [0.80, 0.85, 0.90, 0.95, 1.00, 1.05, 1.10, 1.15, 1.20, 1.25];

/// Minimum mean peak-to-background ratio for a detection to count.
const RESPONSE_THRESHOLD: f64 = 2.0;

/// Per-peak ratio cap: one accidental spectral spike of the cover image
/// must not carry a whole candidate over the threshold.
const RESPONSE_CAP: f64 = 6.0;

/// One template peak in normalized polar form.
#[derive(Debug, Clone, Copy)]
pub struct NormalizedPeak {
    /// Radius as a fraction of the minimum image dimension.
    pub radius: f64,
    /// Angle in radians.
    pub angle: f64,
}

/// The process-wide calibration pattern.
#[derive(Debug)]
pub struct SynchTemplate {
    peaks: [NormalizedPeak; K],
}

impl SynchTemplate {
    /// The fixed reference template, built once and shared read-only.
    pub fn reference() -> &'static SynchTemplate {
        static TEMPLATE: OnceLock<SynchTemplate> = OnceLock::new();
        TEMPLATE.get_or_init(|| {
            let mut rng = ChaCha20Rng::from_seed(TEMPLATE_SEED);
            let mut peaks = [NormalizedPeak { radius: 0.0, angle: 0.0 }; K];
            for peak in peaks.iter_mut() {
                peak.angle = rng.gen_range(0.0..std::f64::consts::TAU);
                peak.radius = rng.gen_range(R_MIN_FRAC..R_MAX_FRAC);
            }
            SynchTemplate { peaks }
        })
    }

    /// Peak positions in centered frequency coordinates for an image size.
    fn positions(&self, width: usize, height: usize) -> Vec<(f64, f64)> {
        let min_dim = width.min(height) as f64;
        self.peaks
            .iter()
            .map(|p| {
                let r = p.radius * min_dim;
                (r * p.angle.cos(), r * p.angle.sin())
            })
            .collect()
    }
}

/// Estimated geometric transform of a suspect image.
#[derive(Debug, Clone, Copy)]
pub struct AffineEstimate {
    /// Rotation in degrees, positive = counter-clockwise.
    pub rotation_deg: f64,
    /// Uniform scale factor.
    pub scale: f64,
    /// Mean peak-to-background response of the winning candidate.
    pub response: f64,
}

impl AffineEstimate {
    pub fn is_identity(&self) -> bool {
        self.rotation_deg == 0.0 && self.scale == 1.0
    }
}

/// Add the template peaks to a luma plane, returning the modified plane.
///
/// Peaks are added in the DFT along the existing phase, with the Hermitian
/// conjugate mirrored so the inverse transform stays real-valued. Amplitude
/// is `PEAK_GAIN × strength × local mean magnitude`.
pub fn embed(plane: &[f64], width: usize, height: usize, strength: f64) -> Vec<f64> {
    let mut spectrum = fft2d::fft2d(plane, width, height);
    let positions = SynchTemplate::reference().positions(width, height);

    for &(u, v) in &positions {
        let su = (u.round() as i64).rem_euclid(width as i64) as usize;
        let sv = (v.round() as i64).rem_euclid(height as i64) as usize;
        let idx = sv * width + su;

        let local = local_mean_magnitude(&spectrum, su, sv);
        let add_mag = PEAK_GAIN * strength * local.max(1.0);

        add_along_phase(&mut spectrum.data[idx], add_mag);

        // Hermitian conjugate position keeps the IFFT real.
        let cu = (width - su) % width;
        let cv = (height - sv) % height;
        let conj_idx = cv * width + cu;
        if conj_idx != idx {
            add_along_phase(&mut spectrum.data[conj_idx], add_mag);
        }
    }

    fft2d::ifft2d(&spectrum)
}

fn add_along_phase(c: &mut Complex64, magnitude: f64) {
    let norm = c.norm();
    let phase = if norm > 1e-9 {
        *c / norm
    } else {
        Complex64::new(1.0, 0.0)
    };
    *c += phase * magnitude;
}

/// Search the candidate grid for the geometric transform the image has
/// undergone.
///
/// Returns `None` when no candidate's mean peak response clears the
/// threshold — the template is absent (or destroyed), and the caller must
/// assume identity geometry.
pub fn estimate_transform(plane: &[f64], width: usize, height: usize) -> Option<AffineEstimate> {
    let spectrum = fft2d::fft2d(plane, width, height);
    let magnitude = fft2d::shifted_magnitude(&spectrum);
    let positions = SynchTemplate::reference().positions(width, height);

    let mut best: Option<AffineEstimate> = None;
    let mut identity_response = None;

    for rot_deg in -ROT_RANGE_DEG..=ROT_RANGE_DEG {
        let theta = (rot_deg as f64).to_radians();
        let (sin_t, cos_t) = theta.sin_cos();
        for &scale in &SCALE_STEPS {
            let mut total = 0.0f64;
            let mut counted = 0usize;

            for &(u, v) in &positions {
                // Image rotated by θ rotates the spectrum by θ; image scaled
                // by s moves frequencies to r/s.
                let ur = (u * cos_t - v * sin_t) / scale;
                let vr = (u * sin_t + v * cos_t) / scale;
                if let Some(ratio) = peak_response(&magnitude, width, height, ur, vr) {
                    total += ratio.min(RESPONSE_CAP);
                    counted += 1;
                }
            }

            if counted < K / 2 {
                continue;
            }
            let response = total / counted as f64;
            if rot_deg == 0 && scale == 1.0 {
                identity_response = Some(response);
            }
            if best.map_or(true, |b| response > b.response) {
                best = Some(AffineEstimate {
                    rotation_deg: rot_deg as f64,
                    scale,
                    response,
                });
            }
        }
    }

    // Neighboring grid cells of the identity score almost as high on an
    // untouched image; resolve near-ties in favor of not resampling.
    if let (Some(idr), Some(b)) = (identity_response, best) {
        if !b.is_identity() && idr >= b.response * 0.97 {
            best = Some(AffineEstimate {
                rotation_deg: 0.0,
                scale: 1.0,
                response: idr,
            });
        }
    }

    let winner = best.filter(|b| b.response >= RESPONSE_THRESHOLD);
    if let Some(est) = winner {
        debug!(
            rotation_deg = est.rotation_deg,
            scale = est.scale,
            response = est.response,
            "synchronization template located"
        );
    }
    winner
}

/// Peak-to-background ratio at one expected position on the centered
/// magnitude spectrum: best bin within ±1, divided by the mean of the
/// surrounding ring (radius 2..=4). `None` when the position (or its whole
/// ring) falls outside the spectrum.
fn peak_response(
    magnitude: &[f64],
    width: usize,
    height: usize,
    u: f64,
    v: f64,
) -> Option<f64> {
    let cx = (width / 2) as i64;
    let cy = (height / 2) as i64;
    let px = cx + u.round() as i64;
    let py = cy + v.round() as i64;

    let mut peak = 0.0f64;
    let mut ring_sum = 0.0f64;
    let mut ring_count = 0usize;

    for dy in -4i64..=4 {
        for dx in -4i64..=4 {
            let x = px + dx;
            let y = py + dy;
            if x < 0 || x >= width as i64 || y < 0 || y >= height as i64 {
                continue;
            }
            let m = magnitude[y as usize * width + x as usize];
            if dx.abs() <= 1 && dy.abs() <= 1 {
                peak = peak.max(m);
            } else {
                ring_sum += m;
                ring_count += 1;
            }
        }
    }

    if ring_count < 8 {
        return None;
    }
    let background = (ring_sum / ring_count as f64).max(1e-9);
    Some(peak / background)
}

/// Mean magnitude of the 3×3 neighborhood around an unshifted bin.
fn local_mean_magnitude(spectrum: &fft2d::Spectrum2D, u: usize, v: usize) -> f64 {
    let w = spectrum.width as i64;
    let h = spectrum.height as i64;
    let mut sum = 0.0f64;
    let mut count = 0usize;

    for dv in -1i64..=1 {
        for du in -1i64..=1 {
            let x = (u as i64 + du).rem_euclid(w);
            let y = (v as i64 + dv).rem_euclid(h);
            sum += spectrum.data[y as usize * spectrum.width + x as usize].norm();
            count += 1;
        }
    }
    sum / count as f64
}
