//! Persisted records: the session and the in-flight login context.
//!
//! Both are JSON objects stored under fixed keys. A record that fails to parse
//! or validate is treated as absent and removed from the store.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};
use zklogin_auth::{bind_nonce, is_hex_address, AuthError, UserInfo};
use zklogin_crypto::{base64url_decode, base64url_encode, CryptoError, EphemeralKeypair};

use crate::error::StoreError;
use crate::store::KeyValueStore;

pub const SESSION_KEY: &str = "zklogin_session";
pub const CONTEXT_KEY: &str = "ephemeral_keypair";

/// A JSON record stored under a fixed key.
pub trait Record: Serialize + DeserializeOwned {
    const KEY: &'static str;

    /// Semantic checks beyond JSON shape.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Persisted form of an authenticated session. The JWT is not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub user_address: String,
    pub user_info: UserInfo,
    /// Unix milliseconds
    pub timestamp: i64,
}

impl Record for SessionRecord {
    const KEY: &'static str = SESSION_KEY;

    fn validate(&self) -> Result<(), String> {
        if is_hex_address(&self.user_address) {
            Ok(())
        } else {
            Err(format!("invalid address {:?}", self.user_address))
        }
    }
}

/// Persisted login attempt: everything needed to finish the flow after a
/// full-page redirect. Key material is base64url; zeroized on drop.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct ContextRecord {
    pub private_key: String,
    pub public_key: String,
    pub randomness: String,
    pub max_epoch: u64,
}

impl ContextRecord {
    pub fn new(keypair: &EphemeralKeypair, randomness: &str, max_epoch: u64) -> Self {
        Self {
            private_key: base64url_encode(&keypair.private_key_bytes()),
            public_key: base64url_encode(&keypair.public_key_bytes()),
            randomness: randomness.to_string(),
            max_epoch,
        }
    }

    /// Rebuild the keypair, checking it against the stored public key.
    pub fn keypair(&self) -> Result<EphemeralKeypair, AuthError> {
        let secret = Zeroizing::new(base64url_decode(&self.private_key)?);
        let keypair = EphemeralKeypair::from_private_key(&secret)?;
        let public = base64url_decode(&self.public_key)?;
        if keypair.public_key_bytes() != public {
            return Err(AuthError::Crypto(CryptoError::InvalidPrivateKey(
                "stored public key does not match private key".to_string(),
            )));
        }
        Ok(keypair)
    }

    /// Recompute the nonce this context was started with.
    pub fn nonce(&self, keypair: &EphemeralKeypair) -> String {
        bind_nonce(&keypair.public_key_bytes(), self.max_epoch, &self.randomness)
    }
}

impl Record for ContextRecord {
    const KEY: &'static str = CONTEXT_KEY;

    fn validate(&self) -> Result<(), String> {
        if self.randomness.is_empty() {
            return Err("empty randomness".to_string());
        }
        self.keypair().map(|_| ()).map_err(|e| e.to_string())
    }
}

impl std::fmt::Debug for ContextRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextRecord")
            .field("public_key", &self.public_key)
            .field("max_epoch", &self.max_epoch)
            .finish_non_exhaustive()
    }
}

/// Load a record. Malformed or invalid records are removed and reported absent.
pub fn load<R: Record>(store: &dyn KeyValueStore) -> Result<Option<R>, StoreError> {
    let raw = match store.get(R::KEY)? {
        Some(raw) => Zeroizing::new(raw),
        None => return Ok(None),
    };

    let problem = match serde_json::from_str::<R>(&raw) {
        Ok(record) => match record.validate() {
            Ok(()) => return Ok(Some(record)),
            Err(reason) => reason,
        },
        Err(e) => e.to_string(),
    };

    tracing::warn!(key = R::KEY, %problem, "dropping malformed persisted record");
    store.remove(R::KEY)?;
    Ok(None)
}

/// Replace the stored record.
pub fn save<R: Record>(store: &dyn KeyValueStore, record: &R) -> Result<(), StoreError> {
    let json = Zeroizing::new(serde_json::to_string(record)?);
    store.set(R::KEY, &json)
}

pub fn clear<R: Record>(store: &dyn KeyValueStore) -> Result<(), StoreError> {
    store.remove(R::KEY)
}
