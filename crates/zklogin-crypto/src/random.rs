//! Secure randomness from the OS CSPRNG.
//!
//! There is no fallback generator: if `getrandom` fails the caller gets
//! `CryptoError::RngFailed` and must treat it as a fatal environment problem.

use zeroize::Zeroize;

use crate::error::CryptoError;

/// Fill a fixed-size array with random bytes.
pub fn random_bytes<const N: usize>() -> Result<[u8; N], CryptoError> {
    let mut bytes = [0u8; N];
    getrandom::getrandom(&mut bytes).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(bytes)
}

/// Generate `n_bytes` random bytes rendered as `2 * n_bytes` lowercase hex chars.
pub fn random_hex(n_bytes: usize) -> Result<String, CryptoError> {
    let mut bytes = vec![0u8; n_bytes];
    getrandom::getrandom(&mut bytes).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    let encoded = hex::encode(&bytes);
    bytes.zeroize();
    Ok(encoded)
}
