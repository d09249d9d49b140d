pub mod base64url;
pub mod ephemeral;
pub mod error;
pub mod random;

pub use base64url::{
    base64url_decode, base64url_encode, decode_bit_accumulator, decode_canonical, decode_with,
    DecodeStrategy, DECODE_STRATEGIES,
};
pub use ephemeral::{verify, EphemeralKeypair, PRIVATE_KEY_LENGTH, PUBLIC_KEY_LENGTH};
pub use error::CryptoError;
pub use random::{random_bytes, random_hex};
