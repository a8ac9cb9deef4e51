// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! Payload packet construction and parsing.
//!
//! The packet is the fixed-size binary container exchanged between embedder
//! and extractor. Both strategies carry the same layout:
//!
//! ```text
//! [3 bytes] magic "LMK"
//! [1 byte ] message length (UTF-8 byte count)
//! [N bytes] message, UTF-8
//! [.......] zero padding to data_len (255 − parity)
//! [parity ] Reed-Solomon parity symbols
//! ```
//!
//! The data portion is padded to a constant size regardless of message
//! length — the fixed-size RS block requires it, and it keeps the embedded
//! bit count identical for every message. Bytes are serialized MSB-first
//! into the bit stream.
//!
//! The length field counts *bytes*, not characters: the parser slices the
//! message region by byte offset, and a byte count is what makes multi-byte
//! UTF-8 text round-trip exactly.

use tracing::debug;

use crate::mark::config::{AlgorithmConfig, HEADER_LEN, MAGIC, PACKET_LEN};
use crate::mark::ecc::RsCodec;
use crate::mark::error::WatermarkError;

/// Result of decoding an extracted bit stream.
///
/// One tagged outcome per failure category — decode never signals through a
/// sentinel string, and a failed decode is a value, not an `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Clean decode: magic matched, error correction succeeded, message is
    /// valid UTF-8.
    Success(String),
    /// Error correction and framing succeeded but the message bytes were not
    /// valid UTF-8; the text is a lossy decode and should not be trusted for
    /// exact comparison.
    Degraded(String),
    /// The corrected data does not start with the magic — the image carries
    /// no watermark (or a watermark from a different system).
    NotDetected,
    /// More corrupted bytes than the parity can repair.
    Uncorrectable,
    /// Magic matched but the length field exceeds the maximum the layout
    /// allows — a damaged or forged header.
    MalformedLength,
    /// Fewer bits than one packet; the capture was truncated.
    InsufficientData,
}

impl DecodeOutcome {
    /// The recovered text, if any (clean or degraded).
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Success(t) | Self::Degraded(t) => Some(t),
            _ => None,
        }
    }

    /// True only for a clean, non-degraded decode.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Build the error-corrected bit stream for `text`.
///
/// The result always has exactly `cfg.packet_bits()` bits (0/1 values,
/// MSB-first per byte).
///
/// # Errors
/// [`WatermarkError::TextTooLong`] when the UTF-8 byte length of `text`
/// exceeds `cfg.max_text_len()`. Checked before anything is built.
pub fn encode_packet(text: &str, cfg: &AlgorithmConfig) -> Result<Vec<u8>, WatermarkError> {
    let max = cfg.max_text_len();
    if text.len() > max {
        return Err(WatermarkError::TextTooLong { max });
    }

    let mut data = Vec::with_capacity(cfg.data_len());
    data.extend_from_slice(&MAGIC);
    data.push(text.len() as u8);
    data.extend_from_slice(text.as_bytes());
    data.resize(cfg.data_len(), 0);

    let codec = RsCodec::new(cfg.parity_len);
    let packet = codec.encode(&data);
    debug_assert_eq!(packet.len(), PACKET_LEN);

    debug!(
        text_len = text.len(),
        packet_len = packet.len(),
        parity = cfg.parity_len,
        "payload packet built"
    );

    Ok(bytes_to_bits(&packet))
}

/// Decode a bit stream back into a message.
///
/// Consumes the leading `cfg.packet_bits()` bits; anything beyond is
/// ignored. Every failure category maps to its own [`DecodeOutcome`]
/// variant — see the module docs for the layout being parsed.
pub fn decode_packet(bits: &[u8], cfg: &AlgorithmConfig) -> DecodeOutcome {
    if bits.len() < cfg.packet_bits() {
        return DecodeOutcome::InsufficientData;
    }

    let packet = bits_to_bytes(&bits[..cfg.packet_bits()]);

    let codec = RsCodec::new(cfg.parity_len);
    let (data, corrected) = match codec.decode(&packet) {
        Ok(ok) => ok,
        Err(_) => return DecodeOutcome::Uncorrectable,
    };
    if corrected > 0 {
        debug!(corrected, capacity = codec.correction_capacity(), "packet repaired");
    }

    if data[..MAGIC.len()] != MAGIC {
        return DecodeOutcome::NotDetected;
    }

    let len = data[MAGIC.len()] as usize;
    if len > cfg.max_text_len() {
        return DecodeOutcome::MalformedLength;
    }

    let message = &data[HEADER_LEN..HEADER_LEN + len];
    match core::str::from_utf8(message) {
        Ok(text) => DecodeOutcome::Success(text.to_owned()),
        Err(_) => {
            // Keep what survives instead of failing the whole decode; the
            // caller sees the degraded marker.
            let lossy = String::from_utf8_lossy(message).into_owned();
            DecodeOutcome::Degraded(lossy)
        }
    }
}

/// Convert bytes to a bit vector (MSB first within each byte).
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for bit_pos in (0..8).rev() {
            bits.push((byte >> bit_pos) & 1);
        }
    }
    bits
}

/// Convert a bit vector (MSB first) back to bytes. The last byte is
/// zero-padded if `bits.len()` is not a multiple of 8.
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(bits.len().div_ceil(8));
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for (i, &bit) in chunk.iter().enumerate() {
            byte |= (bit & 1) << (7 - i);
        }
        bytes.push(byte);
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> AlgorithmConfig {
        AlgorithmConfig::default()
    }

    #[test]
    fn packet_layout() {
        let bits = encode_packet("A", &cfg()).unwrap();
        assert_eq!(bits.len(), 2040);

        let bytes = bits_to_bytes(&bits);
        assert_eq!(&bytes[..3], b"LMK");
        assert_eq!(bytes[3], 1);
        assert_eq!(bytes[4], b'A');
        // Padding region up to the data boundary is zero.
        assert!(bytes[5..cfg().data_len()].iter().all(|&b| b == 0));
    }

    #[test]
    fn roundtrip_boundary_lengths() {
        let c = cfg();
        let max = c.max_text_len();
        for text in [
            String::new(),
            "x".to_string(),
            "Hello, watermark!".to_string(),
            "y".repeat(max - 1),
            "z".repeat(max),
        ] {
            let bits = encode_packet(&text, &c).unwrap();
            assert_eq!(decode_packet(&bits, &c), DecodeOutcome::Success(text));
        }
    }

    #[test]
    fn one_byte_over_capacity_rejected() {
        let c = cfg();
        let too_long = "a".repeat(c.max_text_len() + 1);
        match encode_packet(&too_long, &c) {
            Err(WatermarkError::TextTooLong { max }) => assert_eq!(max, c.max_text_len()),
            other => panic!("expected TextTooLong, got {other:?}"),
        }
    }

    #[test]
    fn multibyte_text_roundtrips() {
        // Length field is a byte count, so multi-byte code points must
        // survive exactly.
        let c = cfg();
        let text = "héllo wörld ✓";
        let bits = encode_packet(text, &c).unwrap();
        assert_eq!(decode_packet(&bits, &c), DecodeOutcome::Success(text.to_string()));
    }

    #[test]
    fn corrupted_bytes_within_capacity_recover() {
        let c = cfg();
        let text = "survives corruption";
        let bits = encode_packet(text, &c).unwrap();

        let mut bytes = bits_to_bytes(&bits);
        // Flip 10 byte positions spread across the packet.
        for i in 0..10 {
            bytes[i * 23 + 5] ^= 0xFF;
        }
        let rebits = bytes_to_bits(&bytes);
        assert_eq!(decode_packet(&rebits, &c), DecodeOutcome::Success(text.to_string()));
    }

    #[test]
    fn too_much_corruption_is_uncorrectable() {
        let c = cfg();
        let bits = encode_packet("gone", &c).unwrap();
        let mut bytes = bits_to_bytes(&bits);
        for i in 0..16 {
            bytes[i * 15] ^= 0xFF;
        }
        let rebits = bytes_to_bits(&bytes);
        assert_eq!(decode_packet(&rebits, &c), DecodeOutcome::Uncorrectable);
    }

    #[test]
    fn wrong_magic_reports_not_detected() {
        let c = cfg();
        // A valid RS packet whose data starts with the wrong magic.
        let codec = RsCodec::new(c.parity_len);
        let mut data = vec![0u8; c.data_len()];
        data[..3].copy_from_slice(b"XXX");
        data[3] = 1;
        data[4] = b'A';
        let bits = bytes_to_bits(&codec.encode(&data));
        assert_eq!(decode_packet(&bits, &c), DecodeOutcome::NotDetected);
    }

    #[test]
    fn oversized_length_field_is_malformed() {
        let c = cfg();
        let codec = RsCodec::new(c.parity_len);
        let mut data = vec![0u8; c.data_len()];
        data[..3].copy_from_slice(&MAGIC);
        data[3] = 255; // > max_text_len
        let bits = bytes_to_bits(&codec.encode(&data));
        assert_eq!(decode_packet(&bits, &c), DecodeOutcome::MalformedLength);
    }

    #[test]
    fn truncated_stream_is_insufficient() {
        let c = cfg();
        let bits = encode_packet("short", &c).unwrap();
        assert_eq!(decode_packet(&bits[..100], &c), DecodeOutcome::InsufficientData);
        assert_eq!(decode_packet(&[], &c), DecodeOutcome::InsufficientData);
    }

    #[test]
    fn invalid_utf8_degrades_instead_of_failing() {
        let c = cfg();
        let codec = RsCodec::new(c.parity_len);
        let mut data = vec![0u8; c.data_len()];
        data[..3].copy_from_slice(&MAGIC);
        data[3] = 3;
        data[4] = b'O';
        data[5] = 0xFF; // invalid continuation
        data[6] = b'k';
        let bits = bytes_to_bits(&codec.encode(&data));
        match decode_packet(&bits, &c) {
            DecodeOutcome::Degraded(text) => {
                assert!(text.starts_with('O'));
                assert!(text.ends_with('k'));
            }
            other => panic!("expected Degraded, got {other:?}"),
        }
    }

    #[test]
    fn bytes_bits_roundtrip() {
        let original = vec![0xDE, 0xAD, 0xBE, 0xEF];
        let bits = bytes_to_bits(&original);
        assert_eq!(bits.len(), 32);
        assert_eq!(bits_to_bytes(&bits), original);
    }

    #[test]
    fn bits_to_bytes_partial_byte() {
        // 5 bits produce one zero-padded byte: 10110_000.
        assert_eq!(bits_to_bytes(&[1, 0, 1, 1, 0]), vec![0xB0]);
    }
}
