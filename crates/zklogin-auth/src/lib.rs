//! Identity-token primitives for zkLogin-style account derivation.
//!
//! This crate provides pure-Rust implementations of:
//! - Structural JWT decoding and validation (no signature verification)
//! - Synthetic demo tokens that go through the same codec
//! - Nonce binding of an ephemeral key, expiry epoch, and randomness
//! - OAuth authorization URLs and token exchange payloads
//! - Placeholder address derivation from a token and a user salt
//!
//! Flow orchestration (key persistence, token exchange transport, sessions)
//! lives in `zklogin-session`.

mod address;
mod error;
mod jwt;
mod nonce;
mod oauth;
mod salt;
mod types;

pub use address::{
    address_seed, derive_address, is_hex_address, is_valid_address, prepare_zk_login_inputs,
    AddressDeriver, PlaceholderAddressDeriver, ZkLoginInputs, ADDRESS_LENGTH, DEFAULT_KEY_CLAIM,
};
pub use error::AuthError;
pub use jwt::{
    decode, decode_header, encode_unsigned, ensure_structure, is_expired, is_expired_at, issuer,
    issuer_to_provider, payload_segment, synthetic_token, validate_structure,
    SYNTHETIC_TOKEN_TTL_SECS,
};
pub use nonce::{bind_nonce, generate_randomness, verify_nonce, NONCE_HEX_LENGTH, RANDOMNESS_LENGTH};
pub use oauth::{
    build_auth_url, parse_token_response, validate_oauth_config, ConfigurationStatus,
    ProviderConfig, TokenRequest, CALLBACK_PATH, FACEBOOK_PLACEHOLDER_CLIENT_ID,
    GOOGLE_PLACEHOLDER_CLIENT_ID,
};
pub use salt::{generate_user_salt, is_valid_salt, SALT_LENGTH};
pub use types::{
    Audience, JwtHeader, JwtPayload, MockIdentity, ProviderId, UserInfo, REQUIRED_CLAIMS,
};
