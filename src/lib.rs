// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! # lumamark
//!
//! Blind watermarking engine for raster images: embeds a short text message
//! imperceptibly into the luma plane of a decoded pixel buffer and recovers
//! it later without access to the original image. Two embedding strategies:
//!
//! - **Wavelet-QIM** (primary): single-level Haar decomposition +
//!   quantization-index modulation on the low-frequency subband. Best
//!   fidelity; blind extraction assumes no geometric transform.
//! - **Block-frequency** (secondary): per-8×8-block DCT coefficient-pair
//!   embedding with perceptual masking, plus a DFT synchronization template
//!   so rotation/scale can be estimated and undone before extraction.
//!
//! The payload is framed with a 3-byte magic and a length field, padded to a
//! fixed block, and protected by Reed-Solomon parity so a bounded number of
//! corrupted bytes still decode exactly. All processing is synchronous and
//! pure; the caller supplies a decoded height × width × 3 pixel buffer and
//! owns all result buffers.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use lumamark::{AlgorithmConfig, PixelBuffer, embed_watermark, verify_watermark};
//!
//! let cfg = AlgorithmConfig::default();
//! let image = PixelBuffer::from_raw(pixels, width, height).unwrap();
//! let marked = embed_watermark(&image, "owned by me", 1.0, &cfg).unwrap();
//! let report = verify_watermark(&marked.image, &cfg);
//! assert_eq!(report.watermark_text.as_deref(), Some("owned by me"));
//! ```

pub mod mark;
pub mod metrics;
pub mod pixel;

pub use mark::config::{startup_check, AlgorithmConfig, EmbedMethod, WaveletKind};
pub use mark::error::WatermarkError;
pub use mark::payload::DecodeOutcome;
pub use mark::{
    embed_watermark, extract_watermark, extract_with_reference, verify_watermark,
    EmbeddingResult, ExtractionReport, VerificationReport,
};
pub use metrics::{psnr, ssim};
pub use pixel::PixelBuffer;
