// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! Reed-Solomon error correction over GF(2^8).
//!
//! Systematic RS(255, 255−parity) with the primitive polynomial 0x11D
//! (x^8+x^4+x^3+x^2+1). Decoding is the classical chain — Berlekamp-Massey
//! error locator, a root walk over the field for the error positions, and
//! the Forney formula for the error values. Packets here are always one
//! full 255-symbol block (the payload codec pads data to `255 − parity`
//! bytes), so there is no shortened-code path.
//!
//! An [`RsCodec`] is built once from the configured parity length and
//! injected into the payload codec; the generator polynomial lives in the
//! codec value, the field tables are process-wide.
//!
//! Polynomial conventions: the generator and codewords are kept
//! highest-degree-first (codeword symbol 0 is the x^254 coefficient); the
//! locator, syndrome, and evaluator polynomials are ascending-power.

use std::sync::OnceLock;

/// Primitive polynomial for GF(2^8): x^8 + x^4 + x^3 + x^2 + 1.
const PRIM_POLY: u16 = 0x11D;

/// RS block size over GF(2^8).
pub const BLOCK_LEN: usize = 255;

/// Log/antilog tables for the 256-element field.
///
/// `alog[p]` is α^p for p in 0..255; `log` is its inverse on the nonzero
/// elements. Products reduce exponents mod 255 explicitly.
struct Field {
    log: [u8; 256],
    alog: [u8; 255],
}

impl Field {
    fn get() -> &'static Field {
        static FIELD: OnceLock<Field> = OnceLock::new();
        FIELD.get_or_init(|| {
            let mut log = [0u8; 256];
            let mut alog = [0u8; 255];
            let mut v = 1u16;
            for (p, slot) in alog.iter_mut().enumerate() {
                *slot = v as u8;
                log[v as usize] = p as u8;
                v <<= 1;
                if v & 0x100 != 0 {
                    v ^= PRIM_POLY;
                }
            }
            Field { log, alog }
        })
    }

    /// α^exponent, exponent reduced mod 255.
    fn alpha_pow(&self, exponent: usize) -> u8 {
        self.alog[exponent % 255]
    }

    fn mul(&self, a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        let e = self.log[a as usize] as usize + self.log[b as usize] as usize;
        self.alog[e % 255]
    }

    /// a / b. Division by zero is a caller bug.
    fn div(&self, a: u8, b: u8) -> u8 {
        debug_assert_ne!(b, 0, "division by zero in GF(2^8)");
        if a == 0 {
            return 0;
        }
        let e = 255 + self.log[a as usize] as usize - self.log[b as usize] as usize;
        self.alog[e % 255]
    }

    /// Evaluate an ascending-power polynomial at `x`.
    fn eval(&self, poly: &[u8], x: u8) -> u8 {
        poly.iter().rev().fold(0u8, |acc, &c| self.mul(acc, x) ^ c)
    }
}

/// Decoding failed: more corrupted symbols than the parity can locate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsDecodeError;

impl core::fmt::Display for RsDecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Reed-Solomon: too many errors to correct")
    }
}

impl std::error::Error for RsDecodeError {}

/// Systematic RS(255, 255−parity) codec for one configured parity length.
#[derive(Debug, Clone)]
pub struct RsCodec {
    parity_len: usize,
    /// Generator polynomial, highest-degree coefficient first
    /// (`gen[0] == 1`, degree == `parity_len`).
    gen: Vec<u8>,
}

impl RsCodec {
    /// Build a codec for `parity_len` parity symbols.
    ///
    /// g(x) = prod_{i=0}^{parity−1} (x − α^i).
    pub fn new(parity_len: usize) -> Self {
        debug_assert!(parity_len > 0 && parity_len < BLOCK_LEN);
        let gf = Field::get();
        let mut gen = vec![1u8];
        for i in 0..parity_len {
            let root = gf.alpha_pow(i);
            // gen *= (x + root)
            let mut next = vec![0u8; gen.len() + 1];
            for (j, &g) in gen.iter().enumerate() {
                next[j] ^= g;
                next[j + 1] ^= gf.mul(g, root);
            }
            gen = next;
        }
        Self { parity_len, gen }
    }

    /// Number of parity symbols appended per block.
    pub fn parity_len(&self) -> usize {
        self.parity_len
    }

    /// Maximum correctable symbol errors per block.
    pub fn correction_capacity(&self) -> usize {
        self.parity_len / 2
    }

    /// Systematically encode `data`, returning data followed by parity.
    ///
    /// Deterministic and size-preserving: the output is always
    /// `data.len() + parity_len` bytes and begins with `data` unchanged.
    /// The parity is the remainder of `data(x) · x^parity mod g(x)`.
    ///
    /// # Panics
    /// Panics if `data.len() + parity_len > 255`.
    pub fn encode(&self, data: &[u8]) -> Vec<u8> {
        assert!(
            data.len() + self.parity_len <= BLOCK_LEN,
            "data length {} exceeds max {}",
            data.len(),
            BLOCK_LEN - self.parity_len
        );
        let gf = Field::get();

        let mut remainder = vec![0u8; self.parity_len];
        for &symbol in data {
            let lead = symbol ^ remainder[0];
            remainder.rotate_left(1);
            *remainder.last_mut().unwrap() = 0;
            if lead != 0 {
                for (r, &g) in remainder.iter_mut().zip(self.gen[1..].iter()) {
                    *r ^= gf.mul(lead, g);
                }
            }
        }

        let mut packet = Vec::with_capacity(data.len() + self.parity_len);
        packet.extend_from_slice(data);
        packet.extend_from_slice(&remainder);
        packet
    }

    /// Decode one full 255-symbol block, correcting up to
    /// [`correction_capacity`](Self::correction_capacity) symbol errors.
    ///
    /// Returns the corrected data portion and the number of corrections
    /// applied (telemetry only; zero for a clean packet).
    ///
    /// # Panics
    /// Panics if `packet.len() != 255`.
    ///
    /// # Errors
    /// [`RsDecodeError`] when the error count exceeds the capacity or the
    /// located error pattern is inconsistent with the syndromes.
    pub fn decode(&self, packet: &[u8]) -> Result<(Vec<u8>, usize), RsDecodeError> {
        assert_eq!(packet.len(), BLOCK_LEN, "packet must be one full RS block");
        let data_len = BLOCK_LEN - self.parity_len;

        let synd = self.syndromes(packet);
        if synd.iter().all(|&s| s == 0) {
            return Ok((packet[..data_len].to_vec(), 0));
        }

        let sigma = error_locator(&synd);
        let num_errors = sigma.len() - 1;
        if num_errors == 0 || num_errors > self.correction_capacity() {
            return Err(RsDecodeError);
        }

        let indices = locate_errors(&sigma).ok_or(RsDecodeError)?;
        let values = error_values(&sigma, &synd, &indices);

        let mut corrected = packet.to_vec();
        for (&idx, &val) in indices.iter().zip(values.iter()) {
            corrected[idx] ^= val;
        }

        // Re-check: a miscorrection must not escape as valid data.
        if self.syndromes(&corrected).iter().any(|&s| s != 0) {
            return Err(RsDecodeError);
        }

        Ok((corrected[..data_len].to_vec(), num_errors))
    }

    /// Syndromes S_i = r(α^i) for i in 0..parity (FCR = 0), with the
    /// received word read highest-degree-first.
    fn syndromes(&self, packet: &[u8]) -> Vec<u8> {
        let gf = Field::get();
        (0..self.parity_len)
            .map(|i| {
                let x = gf.alpha_pow(i);
                packet.iter().fold(0u8, |acc, &r| gf.mul(acc, x) ^ r)
            })
            .collect()
    }
}

/// Berlekamp-Massey: smallest locator σ(x) consistent with the syndromes,
/// ascending powers, `sigma[0] == 1`, trailing zeros trimmed.
fn error_locator(synd: &[u8]) -> Vec<u8> {
    let gf = Field::get();

    let mut sigma = vec![1u8];
    let mut prior = vec![1u8]; // last σ before the degree grew
    let mut degree = 0usize; // current error-count estimate L
    let mut gap = 1usize; // rounds since `prior` was saved (x^gap factor)
    let mut prior_delta = 1u8;

    for round in 0..synd.len() {
        let delta = discrepancy(gf, &sigma, synd, round);
        if delta == 0 {
            gap += 1;
            continue;
        }

        // candidate = σ − (δ/δ')·x^gap·prior
        let ratio = gf.div(delta, prior_delta);
        let mut candidate = sigma.clone();
        if candidate.len() < prior.len() + gap {
            candidate.resize(prior.len() + gap, 0);
        }
        for (i, &p) in prior.iter().enumerate() {
            candidate[i + gap] ^= gf.mul(ratio, p);
        }

        if 2 * degree <= round {
            // Degree grows; the old σ becomes the new reference.
            prior = std::mem::replace(&mut sigma, candidate);
            degree = round + 1 - degree;
            prior_delta = delta;
            gap = 1;
        } else {
            sigma = candidate;
            gap += 1;
        }
    }

    while sigma.len() > 1 && sigma.last() == Some(&0) {
        sigma.pop();
    }
    sigma
}

/// The discrepancy δ_r = Σ_i σ_i · S_{r−i}.
fn discrepancy(gf: &Field, sigma: &[u8], synd: &[u8], round: usize) -> u8 {
    sigma
        .iter()
        .enumerate()
        .take(round + 1)
        .fold(0u8, |acc, (i, &c)| acc ^ gf.mul(c, synd[round - i]))
}

/// Find the error positions by walking σ over the inverse powers of α:
/// σ(α^{−p}) = 0 marks an error at GF position p, i.e. array index
/// `254 − p`. Returns `None` when the root count disagrees with the
/// locator degree.
fn locate_errors(sigma: &[u8]) -> Option<Vec<usize>> {
    let gf = Field::get();
    let expected = sigma.len() - 1;
    let alpha_inv = gf.alpha_pow(254); // α^{-1}

    let mut indices = Vec::with_capacity(expected);
    let mut x = 1u8; // α^{-p}, starting at p = 0
    for p in 0..BLOCK_LEN {
        if gf.eval(sigma, x) == 0 {
            indices.push(BLOCK_LEN - 1 - p);
        }
        x = gf.mul(x, alpha_inv);
    }

    (indices.len() == expected).then_some(indices)
}

/// Forney (FCR = 0): e = X · Ω(X^{−1}) / σ'(X^{−1}) with X = α^p and
/// Ω(x) = S(x)·σ(x) mod x^{2t}.
fn error_values(sigma: &[u8], synd: &[u8], indices: &[usize]) -> Vec<u8> {
    let gf = Field::get();
    let omega = product_mod(synd, sigma, synd.len());
    let sigma_deriv = formal_derivative(sigma);

    indices
        .iter()
        .map(|&idx| {
            let p = BLOCK_LEN - 1 - idx;
            let x = gf.alpha_pow(p);
            let x_inv = gf.alpha_pow(255 - p % 255);

            let num = gf.eval(&omega, x_inv);
            let den = gf.eval(&sigma_deriv, x_inv);
            if den == 0 {
                0
            } else {
                gf.mul(x, gf.div(num, den))
            }
        })
        .collect()
}

/// Product of two ascending-power polynomials, truncated below x^deg.
fn product_mod(a: &[u8], b: &[u8], deg: usize) -> Vec<u8> {
    let gf = Field::get();
    let mut out = vec![0u8; deg];
    for (i, &ai) in a.iter().enumerate().take(deg) {
        if ai == 0 {
            continue;
        }
        for (j, &bj) in b.iter().enumerate().take(deg - i) {
            out[i + j] ^= gf.mul(ai, bj);
        }
    }
    out
}

/// Formal derivative in characteristic 2: the x^i coefficient is
/// `(i+1)·poly[i+1]`, which survives only for even i.
fn formal_derivative(poly: &[u8]) -> Vec<u8> {
    poly.iter()
        .skip(1)
        .enumerate()
        .map(|(i, &c)| if i % 2 == 0 { c } else { 0 })
        .collect()
}
