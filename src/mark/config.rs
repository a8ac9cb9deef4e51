// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! Algorithm configuration shared by the embed and decode sides.
//!
//! Every parameter that affects the bit layout of an embedded packet lives
//! in [`AlgorithmConfig`]. The same value must be used on both sides; a
//! mismatch silently yields garbage bits, so deployments call
//! [`startup_check`] once at process initialization and treat a failure as
//! fatal. Nothing here is re-validated per request.

use crate::mark::error::WatermarkError;

/// Total packet size in bytes: data block + parity, one full RS block.
pub const PACKET_LEN: usize = 255;

/// Header magic, first three bytes of every payload.
pub const MAGIC: [u8; 3] = *b"LMK";

/// Header magic + 1-byte length field.
pub const HEADER_LEN: usize = 4;

/// Minimum accepted embedding strength.
pub const STRENGTH_MIN: f64 = 0.1;

/// Maximum accepted embedding strength.
pub const STRENGTH_MAX: f64 = 5.0;

/// Wavelet family used for the primary strategy's decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveletKind {
    /// Single-level orthonormal Haar. The only family currently supported;
    /// the field exists so the embed/decode match check covers it.
    Haar,
}

/// Which transform-domain strategy carries the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedMethod {
    /// QIM on the wavelet LL subband (primary).
    WaveletQim,
    /// Coefficient-pair embedding in 8×8 DCT blocks (secondary).
    BlockFrequency,
}

impl EmbedMethod {
    /// Whether the strategy carries a geometric synchronization template.
    ///
    /// The wavelet strategy does not: the template peaks would perturb the
    /// same LL coefficients the QIM lattice lives on. Blind extraction under
    /// [`EmbedMethod::WaveletQim`] therefore assumes zero rotation/scale.
    pub fn supports_geometry_sync(self) -> bool {
        match self {
            Self::WaveletQim => false,
            Self::BlockFrequency => true,
        }
    }

    /// The other strategy, used as the orchestrator's fallback.
    pub fn fallback(self) -> Self {
        match self {
            Self::WaveletQim => Self::BlockFrequency,
            Self::BlockFrequency => Self::WaveletQim,
        }
    }
}

/// Immutable algorithm parameters, constructed once per process.
///
/// Structural equality (`PartialEq`) is the contract between the embed and
/// decode sides — see [`startup_check`].
#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmConfig {
    /// Wavelet family for the primary strategy.
    pub wavelet: WaveletKind,
    /// QIM quantization step. Larger = more robust, more visible.
    pub delta: f64,
    /// Reed-Solomon parity bytes per packet; corrects up to `parity/2`
    /// corrupted bytes. Must be even.
    pub parity_len: usize,
    /// Strategy used by `embed_watermark` and as the primary for `verify`.
    pub method: EmbedMethod,
    /// Whether verification may retry the other strategy after the primary
    /// fails. Fallback is always caller-visible in the report.
    pub fallback: bool,
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self {
            wavelet: WaveletKind::Haar,
            delta: 10.0,
            parity_len: 30,
            method: EmbedMethod::WaveletQim,
            fallback: true,
        }
    }
}

impl AlgorithmConfig {
    /// Data bytes per packet (header + message + padding).
    pub fn data_len(&self) -> usize {
        PACKET_LEN - self.parity_len
    }

    /// Maximum message length in UTF-8 bytes.
    pub fn max_text_len(&self) -> usize {
        self.data_len() - HEADER_LEN
    }

    /// Packet size in bits — the number of coefficients every strategy
    /// needs on both sides.
    pub fn packet_bits(&self) -> usize {
        PACKET_LEN * 8
    }

    /// Validate the parameters in isolation.
    ///
    /// # Errors
    /// [`WatermarkError::InvalidConfig`] if the quantization step is not a
    /// positive finite value, or the parity count is odd, zero, or leaves
    /// no room for the header in the data block.
    pub fn validate(&self) -> Result<(), WatermarkError> {
        if !self.delta.is_finite() || self.delta <= 0.0 {
            return Err(WatermarkError::InvalidConfig(format!(
                "quantization step must be positive and finite, got {}",
                self.delta
            )));
        }
        if self.parity_len == 0 || self.parity_len % 2 != 0 {
            return Err(WatermarkError::InvalidConfig(format!(
                "parity length must be even and non-zero, got {}",
                self.parity_len
            )));
        }
        if self.parity_len > PACKET_LEN - HEADER_LEN - 1 {
            return Err(WatermarkError::InvalidConfig(format!(
                "parity length {} leaves no message capacity in a {PACKET_LEN}-byte packet",
                self.parity_len
            )));
        }
        Ok(())
    }
}

/// Validate an embedding strength against the accepted range.
pub fn validate_strength(strength: f64) -> Result<(), WatermarkError> {
    if !strength.is_finite() || !(STRENGTH_MIN..=STRENGTH_MAX).contains(&strength) {
        return Err(WatermarkError::StrengthOutOfRange { value: strength });
    }
    Ok(())
}

/// One-time process health check: both configurations must be valid and
/// structurally equal.
///
/// Call this once at startup with the configuration the embedder will use
/// and the one the decoder will use (often the same value, in which case the
/// check still catches invalid parameters). A failure here is fatal; the
/// per-request paths assume it has passed.
///
/// # Errors
/// - [`WatermarkError::InvalidConfig`] if either side is invalid on its own.
/// - [`WatermarkError::ConfigMismatch`] naming the differing field(s).
pub fn startup_check(
    embed_side: &AlgorithmConfig,
    decode_side: &AlgorithmConfig,
) -> Result<(), WatermarkError> {
    embed_side.validate()?;
    decode_side.validate()?;

    if embed_side == decode_side {
        return Ok(());
    }

    let mut diffs = Vec::new();
    if embed_side.wavelet != decode_side.wavelet {
        diffs.push(format!(
            "wavelet {:?} vs {:?}",
            embed_side.wavelet, decode_side.wavelet
        ));
    }
    if embed_side.delta != decode_side.delta {
        diffs.push(format!("delta {} vs {}", embed_side.delta, decode_side.delta));
    }
    if embed_side.parity_len != decode_side.parity_len {
        diffs.push(format!(
            "parity {} vs {}",
            embed_side.parity_len, decode_side.parity_len
        ));
    }
    if embed_side.method != decode_side.method {
        diffs.push(format!(
            "method {:?} vs {:?}",
            embed_side.method, decode_side.method
        ));
    }
    if embed_side.fallback != decode_side.fallback {
        diffs.push(format!(
            "fallback {} vs {}",
            embed_side.fallback, decode_side.fallback
        ));
    }
    Err(WatermarkError::ConfigMismatch(diffs.join(", ")))
}
