//! Base64url encoding and a lenient, strategy-based decoder for JWT segments.
//!
//! Decoding runs an ordered list of strategies and returns the first success.
//! Inputs are normalised first: surrounding whitespace and trailing `=` are
//! dropped and the standard alphabet (`+`, `/`) is mapped onto the url-safe one.

use base64ct::{Base64UrlUnpadded, Encoding};

use crate::error::CryptoError;

/// A named base64url decoding routine.
#[derive(Clone, Copy)]
pub struct DecodeStrategy {
    pub name: &'static str,
    pub decode: fn(&str) -> Result<Vec<u8>, CryptoError>,
}

impl std::fmt::Debug for DecodeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeStrategy")
            .field("name", &self.name)
            .finish()
    }
}

/// Default decode order: strict constant-time decoder, then bit accumulation.
pub const DECODE_STRATEGIES: &[DecodeStrategy] = &[
    DecodeStrategy {
        name: "base64ct",
        decode: decode_canonical,
    },
    DecodeStrategy {
        name: "bit-accumulator",
        decode: decode_bit_accumulator,
    },
];

/// Base64url encode bytes without padding.
pub fn base64url_encode(data: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(data)
}

/// Base64url decode using [`DECODE_STRATEGIES`].
pub fn base64url_decode(s: &str) -> Result<Vec<u8>, CryptoError> {
    decode_with(DECODE_STRATEGIES, s)
}

/// Try each strategy in order; the first success wins.
pub fn decode_with(strategies: &[DecodeStrategy], input: &str) -> Result<Vec<u8>, CryptoError> {
    let mut last = None;
    for strategy in strategies {
        match (strategy.decode)(input) {
            Ok(bytes) => return Ok(bytes),
            Err(e) => {
                tracing::debug!(strategy = strategy.name, error = %e, "base64url strategy failed");
                last = Some(e);
            }
        }
    }
    Err(CryptoError::Base64Decode {
        attempts: strategies.len(),
        last: last
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no strategies configured".to_string()),
    })
}

fn normalise(input: &str) -> String {
    input
        .trim()
        .trim_end_matches('=')
        .replace('+', "-")
        .replace('/', "_")
}

/// Strict unpadded base64url. Rejects non-zero trailing bits.
pub fn decode_canonical(input: &str) -> Result<Vec<u8>, CryptoError> {
    Base64UrlUnpadded::decode_vec(&normalise(input)).map_err(|e| CryptoError::Base64(e.to_string()))
}

/// Manual decoder: accumulate 6-bit groups and emit a byte whenever 8 bits
/// are buffered. Leftover bits at the end are discarded. Padding is only
/// accepted at the end, where normalisation strips it.
pub fn decode_bit_accumulator(input: &str) -> Result<Vec<u8>, CryptoError> {
    let normalised = normalise(input);
    let mut out = Vec::with_capacity(normalised.len() * 3 / 4);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;

    for (position, character) in normalised.chars().enumerate() {
        let value = sextet(character).ok_or(CryptoError::InvalidBase64Character {
            character,
            position,
        })?;
        buffer = (buffer << 6) | u32::from(value);
        bits += 6;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
            buffer &= (1 << bits) - 1;
        }
    }

    Ok(out)
}

fn sextet(c: char) -> Option<u8> {
    match c {
        'A'..='Z' => Some(c as u8 - b'A'),
        'a'..='z' => Some(c as u8 - b'a' + 26),
        '0'..='9' => Some(c as u8 - b'0' + 52),
        '-' | '+' => Some(62),
        '_' | '/' => Some(63),
        _ => None,
    }
}
