//! User salt resolution.
//!
//! [`StoredSaltProvider`] keeps one random salt per (issuer, subject) pair in
//! the key-value store, so a returning user gets the same salt and the same
//! `address_seed`. The placeholder address still changes per login because it
//! hashes the token payload. A remote salt service can replace the provider by
//! implementing [`SaltProvider`].

use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use zklogin_auth::{generate_user_salt, is_valid_salt, JwtPayload};

use crate::error::{ExternalError, ExternalErrorKind};
use crate::store::KeyValueStore;

pub const SALT_KEY_PREFIX: &str = "zklogin_salt:";

/// Resolves the salt for an authenticated identity.
#[async_trait]
pub trait SaltProvider: Send + Sync {
    async fn salt_for(&self, payload: &JwtPayload) -> Result<String, ExternalError>;
}

/// Storage key for a user's salt. The subject is hashed so it is not stored in clear.
pub fn salt_key(issuer: &str, subject: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(issuer.as_bytes());
    hasher.update([0u8]);
    hasher.update(subject.as_bytes());
    format!("{}{}", SALT_KEY_PREFIX, hex::encode(hasher.finalize()))
}

/// Salt kept in the local key-value store, created on first login.
///
/// Salt records survive logout.
pub struct StoredSaltProvider {
    store: Arc<dyn KeyValueStore>,
}

impl StoredSaltProvider {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SaltProvider for StoredSaltProvider {
    async fn salt_for(&self, payload: &JwtPayload) -> Result<String, ExternalError> {
        let key = salt_key(&payload.iss, &payload.sub);
        let existing = self
            .store
            .get(&key)
            .map_err(|e| ExternalError::new(e.to_string()))?;

        match existing {
            Some(salt) if is_valid_salt(&salt) => return Ok(salt),
            Some(_) => tracing::warn!("replacing malformed stored salt"),
            None => tracing::debug!("no stored salt; generating one"),
        }

        let salt = generate_user_salt()
            .map_err(|e| ExternalError::with_kind(e.to_string(), ExternalErrorKind::Permanent))?;
        self.store
            .set(&key, &salt)
            .map_err(|e| ExternalError::new(e.to_string()))?;
        Ok(salt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn payload(iss: &str, sub: &str) -> JwtPayload {
        serde_json::from_value(json!({"sub": sub, "iss": iss, "aud": "a"})).unwrap()
    }

    #[tokio::test]
    async fn same_identity_same_salt() {
        let store = Arc::new(MemoryStore::new());
        let provider = StoredSaltProvider::new(store.clone());
        let p = payload("https://accounts.google.com", "u1");

        let first = provider.salt_for(&p).await.unwrap();
        let second = provider.salt_for(&p).await.unwrap();
        assert_eq!(first, second);
        assert!(is_valid_salt(&first));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn different_identities_different_salts() {
        let provider = StoredSaltProvider::new(Arc::new(MemoryStore::new()));
        let a = provider
            .salt_for(&payload("https://accounts.google.com", "u1"))
            .await
            .unwrap();
        let b = provider
            .salt_for(&payload("https://www.facebook.com", "u1"))
            .await
            .unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn malformed_salt_is_replaced() {
        let store = Arc::new(MemoryStore::new());
        let key = salt_key("iss", "sub");
        store.set(&key, "not-a-salt").unwrap();

        let provider = StoredSaltProvider::new(store.clone());
        let salt = provider.salt_for(&payload("iss", "sub")).await.unwrap();
        assert!(is_valid_salt(&salt));
        assert_eq!(store.get(&key).unwrap(), Some(salt));
    }

    #[test]
    fn key_hides_subject() {
        let key = salt_key("https://accounts.google.com", "110169484474386276334");
        assert!(key.starts_with(SALT_KEY_PREFIX));
        assert!(!key.contains("110169484474386276334"));
        assert_ne!(key, salt_key("https://accounts.google.co", "m110169484474386276334"));
    }
}
