// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! Error types for the watermarking pipeline.
//!
//! [`WatermarkError`] covers pre-flight and configuration failures only.
//! Decode-side failures (absent watermark, uncorrectable packet, malformed
//! header) are not errors — they are reported as structured
//! [`DecodeOutcome`](crate::mark::payload::DecodeOutcome) values so a failed
//! extraction is an ordinary, inspectable result.

use core::fmt;

/// Errors that can occur before or during watermark embedding, or at
/// process initialization.
#[derive(Debug)]
pub enum WatermarkError {
    /// The message exceeds the packet capacity for the current
    /// error-correction configuration. Reported before any image work.
    TextTooLong {
        /// Maximum allowed UTF-8 byte length.
        max: usize,
    },
    /// The embedding strength is outside the accepted range.
    StrengthOutOfRange { value: f64 },
    /// The image has too few usable coefficients for the packet bit count.
    /// Checked before any buffer mutation.
    InsufficientCapacity { needed: usize, available: usize },
    /// The raw sample slice does not match `width * height * 3`.
    BufferSizeMismatch { expected: usize, actual: usize },
    /// An algorithm parameter is invalid on its own (e.g. odd parity count).
    InvalidConfig(String),
    /// Embed-side and decode-side configurations differ. Fatal at startup,
    /// never raised per request.
    ConfigMismatch(String),
}

impl fmt::Display for WatermarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TextTooLong { max } => {
                write!(f, "text too long (max {max} bytes for current error-correction config)")
            }
            Self::StrengthOutOfRange { value } => {
                write!(f, "strength {value} outside accepted range")
            }
            Self::InsufficientCapacity { needed, available } => {
                write!(f, "image too small: need {needed} coefficients, have {available}")
            }
            Self::BufferSizeMismatch { expected, actual } => {
                write!(f, "pixel buffer size mismatch: expected {expected} bytes, got {actual}")
            }
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Self::ConfigMismatch(msg) => write!(f, "embed/decode configuration mismatch: {msg}"),
        }
    }
}

impl std::error::Error for WatermarkError {}
