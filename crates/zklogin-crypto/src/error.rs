use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Base64 decode error: {0}")]
    Base64(String),

    #[error("Invalid base64 character {character:?} at position {position}")]
    InvalidBase64Character { character: char, position: usize },

    #[error("Base64 decode failed ({attempts} strategies tried): {last}")]
    Base64Decode { attempts: usize, last: String },

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}
