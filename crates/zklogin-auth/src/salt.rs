use zklogin_crypto::random_hex;

use crate::error::AuthError;

/// User salt length in bytes (32 hex chars).
pub const SALT_LENGTH: usize = 16;

/// Generate a fresh random user salt.
///
/// Persisting it per user is the caller's job; a new salt means a new address.
pub fn generate_user_salt() -> Result<String, AuthError> {
    Ok(random_hex(SALT_LENGTH)?)
}

/// True for `SALT_LENGTH * 2` hex chars.
pub fn is_valid_salt(salt: &str) -> bool {
    salt.len() == SALT_LENGTH * 2 && salt.chars().all(|c| c.is_ascii_hexdigit())
}
