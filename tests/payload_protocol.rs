// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! Payload protocol properties exercised through the public surface:
//! bounded error correction, codec idempotence, configuration matching.

use lumamark::mark::payload::{bits_to_bytes, bytes_to_bits, decode_packet, encode_packet};
use lumamark::{startup_check, AlgorithmConfig, DecodeOutcome, WatermarkError};

#[test]
fn codec_idempotent_over_ascii_lengths() {
    let cfg = AlgorithmConfig::default();
    for len in [0usize, 1, 2, 7, 64, 220, 221] {
        let text: String = (0..len).map(|i| (b' ' + (i % 94) as u8) as char).collect();
        let bits = encode_packet(&text, &cfg).unwrap();
        assert_eq!(bits.len(), cfg.packet_bits());
        assert_eq!(
            decode_packet(&bits, &cfg),
            DecodeOutcome::Success(text),
            "length {len}"
        );
    }
}

#[test]
fn fifteen_corrupted_bytes_recover_sixteen_do_not() {
    let cfg = AlgorithmConfig::default();
    let text = "bounded correction";
    let bits = encode_packet(text, &cfg).unwrap();

    let mut fifteen = bits_to_bytes(&bits);
    for i in 0..15 {
        fifteen[i * 16 + 2] ^= 0xC3;
    }
    assert_eq!(
        decode_packet(&bytes_to_bits(&fifteen), &cfg),
        DecodeOutcome::Success(text.into())
    );

    let mut sixteen = bits_to_bytes(&bits);
    for i in 0..16 {
        sixteen[i * 15 + 1] ^= 0xC3;
    }
    assert_eq!(
        decode_packet(&bytes_to_bits(&sixteen), &cfg),
        DecodeOutcome::Uncorrectable
    );
}

#[test]
fn ten_scattered_byte_flips_recover_exact_text() {
    let cfg = AlgorithmConfig::default();
    let text = "Hi";
    let bits = encode_packet(text, &cfg).unwrap();

    let mut bytes = bits_to_bytes(&bits);
    for &pos in &[3usize, 19, 40, 77, 101, 150, 180, 200, 230, 250] {
        bytes[pos] ^= 0x5A;
    }
    assert_eq!(
        decode_packet(&bytes_to_bits(&bytes), &cfg),
        DecodeOutcome::Success("Hi".into())
    );
}

#[test]
fn mismatched_sides_fail_at_startup_not_at_decode() {
    let embed_side = AlgorithmConfig::default();
    let decode_side = AlgorithmConfig {
        parity_len: 32,
        ..AlgorithmConfig::default()
    };

    match startup_check(&embed_side, &decode_side) {
        Err(WatermarkError::ConfigMismatch(msg)) => {
            assert!(msg.contains("parity"), "should name the field: {msg}");
        }
        other => panic!("expected ConfigMismatch, got {other:?}"),
    }
}
