// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! Watermark embedding, extraction, and verification pipelines.
//!
//! Entry points:
//!
//! - [`embed_watermark`]: text + strength + config → watermarked buffer
//!   with PSNR/SSIM fidelity scores.
//! - [`extract_watermark`]: blind extraction with the configured strategy,
//!   including geometric synchronization where the strategy supports it.
//! - [`extract_with_reference`]: informed extraction — realigns the suspect
//!   to a reference image's dimensions first.
//! - [`verify_watermark`]: runs extraction, classifies the outcome, attaches
//!   geometry metadata and a confidence score; optionally falls back to the
//!   other strategy when the primary finds nothing. The fallback is an
//!   explicit, reported choice — never a hidden recovery path.
//!
//! All operations are synchronous, deterministic, and own their working
//! buffers; concurrent calls share nothing but the immutable configuration
//! and the synchronization template.

pub mod blockdct;
pub mod config;
pub mod ecc;
pub mod error;
pub mod fft2d;
pub mod mask;
pub mod payload;
pub mod qim;
pub mod resample;
pub mod template;
pub mod wavelet;

use tracing::{debug, info};

use crate::metrics;
use crate::pixel::PixelBuffer;
use config::{validate_strength, AlgorithmConfig, EmbedMethod};
use error::WatermarkError;
use payload::DecodeOutcome;
use resample::AffineTransform;

/// Confidence for a clean decode by the primary strategy.
const CONFIDENCE_CLEAN: f64 = 1.0;

/// Confidence for a degraded decode, or a clean decode that needed the
/// fallback strategy.
const CONFIDENCE_REDUCED: f64 = 0.5;

/// Output of a successful embedding.
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    /// The watermarked image, same dimensions as the input.
    pub image: PixelBuffer,
    /// Fidelity vs. the input, in dB (∞ for a no-op).
    pub psnr: f64,
    /// Mean structural similarity vs. the input, ≈1 when imperceptible.
    pub ssim: f64,
}

/// Output of one extraction attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    /// What the payload decoder made of the extracted bits.
    pub outcome: DecodeOutcome,
    /// Estimated rotation in degrees (0 when no synchronization ran).
    pub rotation_detected: f64,
    /// Estimated scale factor (1 when no synchronization ran).
    pub scale_detected: f64,
    /// Whether a geometric correction was applied before bit extraction.
    pub geometry_corrected: bool,
}

/// Output of [`verify_watermark`].
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationReport {
    /// True only for a clean, non-degraded decode.
    pub verified: bool,
    /// The recovered message, present for clean and degraded decodes.
    pub watermark_text: Option<String>,
    /// 1.0 clean primary, 0.5 degraded or fallback, 0.0 failure.
    pub confidence: f64,
    pub rotation_detected: f64,
    pub scale_detected: f64,
    pub geometry_corrected: bool,
    /// The strategy that produced the reported outcome, when any decoded.
    pub method: Option<EmbedMethod>,
}

/// Embed `text` into `image` with the configured strategy.
///
/// Pre-flight checks (strength range, text length, capacity) all run before
/// any pixel is touched. The returned buffer has the exact dimensions of
/// the input; fidelity scores compare the two.
///
/// # Errors
/// - [`WatermarkError::StrengthOutOfRange`] for strength outside 0.1–5.0.
/// - [`WatermarkError::TextTooLong`] when the message exceeds packet
///   capacity.
/// - [`WatermarkError::InsufficientCapacity`] when the image is too small
///   for the packet bit count.
pub fn embed_watermark(
    image: &PixelBuffer,
    text: &str,
    strength: f64,
    cfg: &AlgorithmConfig,
) -> Result<EmbeddingResult, WatermarkError> {
    validate_strength(strength)?;
    let bits = payload::encode_packet(text, cfg)?;

    debug!(
        method = ?cfg.method,
        width = image.width(),
        height = image.height(),
        bits = bits.len(),
        "embedding watermark"
    );

    let mut planes = image.to_ycbcr();
    let (w, h) = (planes.width, planes.height);

    planes.y = match cfg.method {
        EmbedMethod::WaveletQim => qim::embed(&planes.y, w, h, &bits, cfg.delta)?,
        EmbedMethod::BlockFrequency => {
            // Capacity first: the template write must not happen for an
            // image that fails the pre-flight check.
            let blocks = blockdct::capacity(w, h);
            if bits.len() > blocks {
                return Err(WatermarkError::InsufficientCapacity {
                    needed: bits.len(),
                    available: blocks,
                });
            }
            let with_template = template::embed(&planes.y, w, h, strength);
            blockdct::embed(&with_template, w, h, &bits, strength)?
        }
    };

    let marked = planes.to_buffer();
    let psnr = metrics::psnr(image, &marked);
    let ssim = metrics::ssim(image, &marked);

    info!(psnr, ssim, text_len = text.len(), "watermark embedded");

    Ok(EmbeddingResult {
        image: marked,
        psnr,
        ssim,
    })
}

/// Blind extraction with the configured strategy.
///
/// Never fails: every failure category is a [`DecodeOutcome`] variant in
/// the report.
pub fn extract_watermark(image: &PixelBuffer, cfg: &AlgorithmConfig) -> ExtractionReport {
    extract_with_method(image, cfg, cfg.method)
}

fn extract_with_method(
    image: &PixelBuffer,
    cfg: &AlgorithmConfig,
    method: EmbedMethod,
) -> ExtractionReport {
    let planes = image.to_ycbcr();
    let (w, h) = (planes.width, planes.height);

    let mut y = planes.y;
    let mut rotation_detected = 0.0;
    let mut scale_detected = 1.0;
    let mut geometry_corrected = false;

    if method.supports_geometry_sync() {
        if let Some(est) = template::estimate_transform(&y, w, h) {
            rotation_detected = est.rotation_deg;
            scale_detected = est.scale;
            if !est.is_identity() {
                let undo = AffineTransform {
                    rotation_rad: est.rotation_deg.to_radians(),
                    scale: est.scale,
                }
                .inverse();
                y = resample::warp_affine(&y, w, h, &undo, w, h);
                geometry_corrected = true;
                debug!(
                    rotation_deg = est.rotation_deg,
                    scale = est.scale,
                    "geometry corrected before extraction"
                );
            }
        }
    }

    let count = cfg.packet_bits();
    let bits = match method {
        EmbedMethod::WaveletQim => qim::extract(&y, w, h, count, cfg.delta),
        EmbedMethod::BlockFrequency => blockdct::extract(&y, w, h, count),
    };

    ExtractionReport {
        outcome: payload::decode_packet(&bits, cfg),
        rotation_detected,
        scale_detected,
        geometry_corrected,
    }
}

/// Informed extraction: realign `suspect` to `reference`'s dimensions, then
/// extract blind.
///
/// Covers the common case where the suspect is a resized copy; the scale
/// estimate is the dimension ratio and no template search is needed.
pub fn extract_with_reference(
    reference: &PixelBuffer,
    suspect: &PixelBuffer,
    cfg: &AlgorithmConfig,
) -> ExtractionReport {
    let (rw, rh) = (reference.width(), reference.height());
    let (sw, sh) = (suspect.width(), suspect.height());

    if (rw, rh) == (sw, sh) {
        return extract_watermark(suspect, cfg);
    }

    let planes = suspect.to_ycbcr();
    let y = resample::resize_plane(&planes.y, sw, sh, rw, rh);
    let scale = (sw as f64 / rw as f64 + sh as f64 / rh as f64) / 2.0;
    debug!(scale, "suspect realigned to reference dimensions");

    let count = cfg.packet_bits();
    let bits = match cfg.method {
        EmbedMethod::WaveletQim => qim::extract(&y, rw, rh, count, cfg.delta),
        EmbedMethod::BlockFrequency => blockdct::extract(&y, rw, rh, count),
    };

    ExtractionReport {
        outcome: payload::decode_packet(&bits, cfg),
        rotation_detected: 0.0,
        scale_detected: scale,
        geometry_corrected: true,
    }
}

/// Verify a suspect image: extraction + outcome classification.
///
/// With the `parallel` feature the primary and fallback strategies run
/// concurrently and the primary's result is preferred; without it the
/// fallback only runs after the primary found nothing.
pub fn verify_watermark(image: &PixelBuffer, cfg: &AlgorithmConfig) -> VerificationReport {
    let (primary, secondary) = run_strategies(image, cfg);
    classify(primary, secondary, cfg.method)
}

#[cfg(not(feature = "parallel"))]
fn run_strategies(
    image: &PixelBuffer,
    cfg: &AlgorithmConfig,
) -> (ExtractionReport, Option<ExtractionReport>) {
    let primary = extract_with_method(image, cfg, cfg.method);
    let secondary = (cfg.fallback && primary.outcome.text().is_none())
        .then(|| extract_with_method(image, cfg, cfg.method.fallback()));
    (primary, secondary)
}

#[cfg(feature = "parallel")]
fn run_strategies(
    image: &PixelBuffer,
    cfg: &AlgorithmConfig,
) -> (ExtractionReport, Option<ExtractionReport>) {
    if !cfg.fallback {
        return (extract_with_method(image, cfg, cfg.method), None);
    }
    let (primary, secondary) = rayon::join(
        || extract_with_method(image, cfg, cfg.method),
        || extract_with_method(image, cfg, cfg.method.fallback()),
    );
    (primary, Some(secondary))
}

fn classify(
    primary: ExtractionReport,
    secondary: Option<ExtractionReport>,
    primary_method: EmbedMethod,
) -> VerificationReport {
    // Preference: clean primary > clean fallback > degraded primary >
    // degraded fallback > failure.
    if primary.outcome.is_clean() {
        return report_from(primary, primary_method, true, CONFIDENCE_CLEAN);
    }
    if let Some(sec) = &secondary {
        if sec.outcome.is_clean() {
            return report_from(sec.clone(), primary_method.fallback(), true, CONFIDENCE_REDUCED);
        }
    }
    if primary.outcome.text().is_some() {
        return report_from(primary, primary_method, false, CONFIDENCE_REDUCED);
    }
    if let Some(sec) = secondary {
        if sec.outcome.text().is_some() {
            return report_from(sec, primary_method.fallback(), false, CONFIDENCE_REDUCED);
        }
    }

    VerificationReport {
        verified: false,
        watermark_text: None,
        confidence: 0.0,
        rotation_detected: primary.rotation_detected,
        scale_detected: primary.scale_detected,
        geometry_corrected: primary.geometry_corrected,
        method: None,
    }
}

fn report_from(
    extraction: ExtractionReport,
    method: EmbedMethod,
    verified: bool,
    confidence: f64,
) -> VerificationReport {
    VerificationReport {
        verified,
        watermark_text: extraction.outcome.text().map(str::to_owned),
        confidence,
        rotation_detected: extraction.rotation_detected,
        scale_detected: extraction.scale_detected,
        geometry_corrected: extraction.geometry_corrected,
        method: Some(method),
    }
}
