//! Account address derivation from an identity token and a user salt.
//!
//! PLACEHOLDER: a real zkLogin deployment derives the address from a Poseidon
//! address seed and proves knowledge of the JWT in zero knowledge. Here the
//! address is a plain SHA-256 digest. It is one-way and deterministic but it
//! is not provable. Swap the [`AddressDeriver`] implementation to plug in a
//! real backend.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::AuthError;
use crate::jwt;

/// Address length in bytes (40 hex chars after `0x`).
pub const ADDRESS_LENGTH: usize = 20;

/// Claim used as the stable user identifier unless configured otherwise.
pub const DEFAULT_KEY_CLAIM: &str = "sub";

const ADDRESS_DOMAIN: &[u8] = b"zklogin:placeholder-address:v1\0";
const ADDRESS_SEED_DOMAIN: &[u8] = b"zklogin:address-seed:v1\0";

/// Derives an account address from a token, a salt, and the key claim name.
pub trait AddressDeriver: Send + Sync {
    fn derive(&self, jwt: &str, salt: &str, claim_name: &str) -> Result<String, AuthError>;
}

/// SHA-256 stand-in for zero-knowledge address derivation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderAddressDeriver;

impl AddressDeriver for PlaceholderAddressDeriver {
    fn derive(&self, jwt: &str, salt: &str, claim_name: &str) -> Result<String, AuthError> {
        derive_address(jwt, salt, claim_name)
    }
}

/// Derive `0x` + 40 hex chars from (claim value, salt, payload segment).
///
/// # Errors
/// - decode errors from [`jwt::decode`]
/// - `MissingClaim` if `claim_name` is absent or empty
pub fn derive_address(jwt: &str, salt: &str, claim_name: &str) -> Result<String, AuthError> {
    let payload = jwt::decode(jwt)?;
    let claim = payload
        .claim(claim_name)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AuthError::MissingClaim(claim_name.to_string()))?;
    let segment = jwt::payload_segment(jwt)?;

    // NUL delimiters keep ("ab", "c") and ("a", "bc") apart.
    let mut hasher = Sha256::new();
    hasher.update(ADDRESS_DOMAIN);
    hasher.update(claim.as_bytes());
    hasher.update([0u8]);
    hasher.update(salt.as_bytes());
    hasher.update([0u8]);
    hasher.update(segment.as_bytes());
    let digest = hasher.finalize();

    Ok(format!("0x{}", hex::encode(&digest[..ADDRESS_LENGTH])))
}

/// True for `0x` followed by exactly 40 lowercase hex chars, the shape
/// [`derive_address`] produces.
pub fn is_valid_address(address: &str) -> bool {
    is_hex_address(address) && address.len() == 2 + ADDRESS_LENGTH * 2
}

/// True for `0x` followed by a non-empty, even-length run of lowercase hex.
/// Accepts any deriver's output, e.g. 32-byte addresses.
pub fn is_hex_address(address: &str) -> bool {
    match address.strip_prefix("0x") {
        Some(hex_part) => {
            !hex_part.is_empty()
                && hex_part.len() % 2 == 0
                && hex_part
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        }
        None => false,
    }
}

/// Address seed binding the subject to the salt (64 hex chars).
pub fn address_seed(subject: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ADDRESS_SEED_DOMAIN);
    hasher.update(subject.as_bytes());
    hasher.update([0u8]);
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Inputs a zero-knowledge proving service would need for this login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZkLoginInputs {
    pub address_seed: String,
    pub max_epoch: u64,
    pub user_salt: String,
    pub jwt: String,
}

pub fn prepare_zk_login_inputs(
    jwt: &str,
    user_salt: &str,
    max_epoch: u64,
) -> Result<ZkLoginInputs, AuthError> {
    let payload = jwt::decode(jwt)?;
    Ok(ZkLoginInputs {
        address_seed: address_seed(&payload.sub, user_salt),
        max_epoch,
        user_salt: user_salt.to_string(),
        jwt: jwt.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::encode_unsigned;
    use crate::salt::generate_user_salt;
    use serde_json::{json, Value};
    use std::collections::HashSet;

    fn token(claims: Value) -> String {
        encode_unsigned(&json!({"alg": "RS256"}), &claims, b"sig").unwrap()
    }

    fn token_for(sub: &str) -> String {
        token(json!({
            "sub": sub,
            "iss": "https://accounts.google.com",
            "aud": "client",
        }))
    }

    #[test]
    fn deterministic_and_well_formed() {
        let jwt = token_for("user-1");
        let a = derive_address(&jwt, "00112233445566778899aabbccddeeff", DEFAULT_KEY_CLAIM).unwrap();
        let b = derive_address(&jwt, "00112233445566778899aabbccddeeff", DEFAULT_KEY_CLAIM).unwrap();
        assert_eq!(a, b);
        assert!(is_valid_address(&a), "{}", a);
        assert_eq!(a.len(), 42);
    }

    #[test]
    fn deriver_trait_matches_free_function() {
        let jwt = token_for("user-1");
        let deriver: &dyn AddressDeriver = &PlaceholderAddressDeriver;
        assert_eq!(
            deriver.derive(&jwt, "salt", "sub").unwrap(),
            derive_address(&jwt, "salt", "sub").unwrap()
        );
    }

    #[test]
    fn different_salts_same_subject_differ() {
        let jwt = token_for("user-1");
        let mut seen = HashSet::new();
        for _ in 0..64 {
            let salt = generate_user_salt().unwrap();
            assert!(seen.insert(derive_address(&jwt, &salt, "sub").unwrap()));
        }
    }

    #[test]
    fn different_subjects_same_salt_differ() {
        let salt = generate_user_salt().unwrap();
        let mut seen = HashSet::new();
        for i in 0..64 {
            let jwt = token_for(&format!("subject-{}", i));
            assert!(seen.insert(derive_address(&jwt, &salt, "sub").unwrap()));
        }
    }

    #[test]
    fn delimiter_prevents_collisions() {
        let a = derive_address(&token_for("ab"), "c", "sub").unwrap();
        let b = derive_address(&token_for("a"), "bc", "sub").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn custom_claim_name() {
        let jwt = token(json!({
            "sub": "s", "iss": "i", "aud": "a", "email": "ada@example.com"
        }));
        let by_email = derive_address(&jwt, "salt", "email").unwrap();
        let by_sub = derive_address(&jwt, "salt", "sub").unwrap();
        assert_ne!(by_email, by_sub);
    }

    #[test]
    fn missing_claim() {
        let jwt = token_for("user-1");
        let err = derive_address(&jwt, "salt", "email").unwrap_err();
        assert!(matches!(err, AuthError::MissingClaim(ref c) if c == "email"));
        assert_eq!(err.to_string(), "JWT does not contain email claim");
    }

    #[test]
    fn empty_claim_counts_as_missing() {
        let jwt = token(json!({"sub": "", "iss": "i", "aud": "a"}));
        assert!(matches!(
            derive_address(&jwt, "salt", "sub"),
            Err(AuthError::MissingClaim(_))
        ));
    }

    #[test]
    fn malformed_token_propagates() {
        assert!(matches!(
            derive_address("a.b", "salt", "sub"),
            Err(AuthError::MalformedToken(_))
        ));
    }

    #[test]
    fn address_validation() {
        assert!(is_valid_address(&format!("0x{}", "ab".repeat(20))));
        assert!(!is_valid_address(&"ab".repeat(21)));
        assert!(!is_valid_address(&format!("0x{}", "AB".repeat(20))));
        assert!(!is_valid_address(&format!("0x{}", "ab".repeat(19))));
    }

    #[test]
    fn hex_address_accepts_other_lengths() {
        assert!(is_hex_address(&format!("0x{}", "ab".repeat(20))));
        assert!(is_hex_address(&format!("0x{}", "ab".repeat(32))));
        assert!(!is_valid_address(&format!("0x{}", "ab".repeat(32))));
        assert!(!is_hex_address("0x"));
        assert!(!is_hex_address("0xabc"));
        assert!(!is_hex_address(&format!("0x{}", "AB".repeat(32))));
        assert!(!is_hex_address(&"ab".repeat(32)));
    }

    #[test]
    fn zk_login_inputs() {
        let jwt = token_for("user-1");
        let inputs = prepare_zk_login_inputs(&jwt, "salt", 77).unwrap();
        assert_eq!(inputs.address_seed, address_seed("user-1", "salt"));
        assert_eq!(inputs.address_seed.len(), 64);
        assert_eq!(inputs.max_epoch, 77);
        assert_eq!(inputs.jwt, jwt);

        let value = serde_json::to_value(&inputs).unwrap();
        assert!(value.get("addressSeed").is_some());
        assert!(value.get("maxEpoch").is_some());
    }
}
