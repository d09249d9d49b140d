//! Ephemeral ECDSA P-256 keypairs for a single login attempt.
//!
//! Public keys are exposed as 33-byte SEC1 compressed points. Signatures are
//! IEEE P1363 (raw r||s, 64 bytes).

use ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::random::random_bytes;

/// P-256 scalar length.
pub const PRIVATE_KEY_LENGTH: usize = 32;

/// SEC1 compressed point length.
pub const PUBLIC_KEY_LENGTH: usize = 33;

/// Short-lived signing keypair owned by one login attempt.
///
/// The inner `SigningKey` zeroizes its scalar on drop.
#[derive(Clone)]
pub struct EphemeralKeypair {
    signing_key: SigningKey,
}

impl EphemeralKeypair {
    /// Generate a fresh keypair from the OS RNG.
    ///
    /// Draws are retried until the scalar is in range (probability of a retry
    /// is about 2^-32).
    pub fn generate() -> Result<Self, CryptoError> {
        loop {
            let scalar = Zeroizing::new(random_bytes::<PRIVATE_KEY_LENGTH>()?);
            if let Ok(keypair) = Self::from_private_key(scalar.as_slice()) {
                return Ok(keypair);
            }
        }
    }

    /// Restore a keypair from its 32-byte private scalar.
    pub fn from_private_key(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != PRIVATE_KEY_LENGTH {
            return Err(CryptoError::InvalidKeyLength {
                expected: PRIVATE_KEY_LENGTH,
                got: bytes.len(),
            });
        }
        let signing_key = SigningKey::from_bytes(bytes.into())
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self { signing_key })
    }

    /// SEC1 compressed public key.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.signing_key
            .verifying_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec()
    }

    /// Lowercase hex of [`Self::public_key_bytes`].
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key_bytes())
    }

    /// Private scalar, wiped when the returned buffer is dropped.
    pub fn private_key_bytes(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.signing_key.to_bytes().to_vec())
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Sign with ECDSA P-256 + SHA-256.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let signature: Signature = self
            .signing_key
            .try_sign(message)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        Ok(signature.to_bytes().to_vec())
    }
}

impl std::fmt::Debug for EphemeralKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralKeypair")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// Verify a P1363 signature against a SEC1-encoded public key.
///
/// Returns false for malformed keys or signatures; never errors.
pub fn verify(public_key: &[u8], message: &[u8], signature_bytes: &[u8]) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_sec1_bytes(public_key) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(signature_bytes) else {
        return false;
    };
    verifying_key.verify(message, &signature).is_ok()
}
