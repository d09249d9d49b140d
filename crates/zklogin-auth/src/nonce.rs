//! Nonce binding between an ephemeral key, an expiry epoch, and randomness.
//!
//! `nonce = hex(SHA-256(hex(public_key) || "-" || max_epoch || "-" || randomness))`
//!
//! The provider echoes the nonce inside the issued JWT, so a returned token
//! whose `nonce` claim differs was not issued for this login attempt.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zklogin_crypto::random_hex;

use crate::error::AuthError;
use crate::types::JwtPayload;

/// Bytes of randomness mixed into each nonce.
pub const RANDOMNESS_LENGTH: usize = 32;

/// Hex width of a bound nonce (SHA-256 output).
pub const NONCE_HEX_LENGTH: usize = 64;

/// Generate fresh nonce randomness (64 hex chars).
pub fn generate_randomness() -> Result<String, AuthError> {
    Ok(random_hex(RANDOMNESS_LENGTH)?)
}

/// Bind an ephemeral public key, max epoch, and randomness into a nonce.
pub fn bind_nonce(public_key: &[u8], max_epoch: u64, randomness: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(hex::encode(public_key).as_bytes());
    hasher.update(b"-");
    hasher.update(max_epoch.to_string().as_bytes());
    hasher.update(b"-");
    hasher.update(randomness.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check that a decoded token carries the nonce this attempt sent.
///
/// A token without a `nonce` claim is a mismatch.
pub fn verify_nonce(expected: &str, payload: &JwtPayload) -> Result<(), AuthError> {
    match payload.nonce.as_deref() {
        Some(got) if bool::from(got.as_bytes().ct_eq(expected.as_bytes())) => Ok(()),
        got => Err(AuthError::NonceMismatch {
            expected: expected.to_string(),
            got: got.map(str::to_string),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn payload_with_nonce(nonce: Option<&str>) -> JwtPayload {
        let mut value = json!({"sub": "s", "iss": "i", "aud": "a"});
        if let Some(n) = nonce {
            value["nonce"] = json!(n);
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn nonce_is_64_hex_chars() {
        let nonce = bind_nonce(&[2u8; 33], 120, &generate_randomness().unwrap());
        assert_eq!(nonce.len(), NONCE_HEX_LENGTH);
        assert!(nonce
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn binding_is_deterministic() {
        let a = bind_nonce(&[7u8; 33], 42, "abcd");
        let b = bind_nonce(&[7u8; 33], 42, "abcd");
        assert_eq!(a, b);
    }

    #[test]
    fn each_input_changes_the_nonce() {
        let base = bind_nonce(&[7u8; 33], 42, "abcd");
        assert_ne!(base, bind_nonce(&[8u8; 33], 42, "abcd"));
        assert_ne!(base, bind_nonce(&[7u8; 33], 43, "abcd"));
        assert_ne!(base, bind_nonce(&[7u8; 33], 42, "abce"));
    }

    #[test]
    fn randomized_bindings_do_not_collide() {
        let mut seen = HashSet::new();
        for epoch in 0..64u64 {
            let randomness = generate_randomness().unwrap();
            assert_eq!(randomness.len(), RANDOMNESS_LENGTH * 2);
            assert!(seen.insert(bind_nonce(&[3u8; 33], epoch, &randomness)));
        }
    }

    #[test]
    fn verify_accepts_matching_nonce() {
        let nonce = bind_nonce(&[1u8; 33], 1, "r");
        assert!(verify_nonce(&nonce, &payload_with_nonce(Some(&nonce))).is_ok());
    }

    #[test]
    fn verify_rejects_different_nonce() {
        let nonce = bind_nonce(&[1u8; 33], 1, "r");
        let err = verify_nonce(&nonce, &payload_with_nonce(Some("deadbeef"))).unwrap_err();
        assert!(matches!(err, AuthError::NonceMismatch { got: Some(_), .. }));
    }

    #[test]
    fn verify_rejects_missing_nonce() {
        let err = verify_nonce("abc", &payload_with_nonce(None)).unwrap_err();
        assert!(matches!(err, AuthError::NonceMismatch { got: None, .. }));
    }
}
