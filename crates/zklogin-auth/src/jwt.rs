//! Structural JWT decoding (no signature verification).
//!
//! Tokens are compact JWS strings: `header.payload.signature`, each segment
//! base64url. Segments are decoded with the lenient strategy list from
//! `zklogin_crypto`, so unpadded, padded, and standard-alphabet inputs all work.

use serde_json::{json, Value};
use zklogin_crypto::{base64url_decode, base64url_encode};

use crate::error::AuthError;
use crate::types::{JwtHeader, JwtPayload, MockIdentity, ProviderId, REQUIRED_CLAIMS};

/// Lifetime of synthetic demo tokens, in seconds.
pub const SYNTHETIC_TOKEN_TTL_SECS: i64 = 3600;

/// Fixed signature segment content of synthetic tokens.
const SYNTHETIC_SIGNATURE: &[u8] = b"mock-signature-for-demo-purposes";

const DEFAULT_PICTURE: &str =
    "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=150&h=150&fit=crop&crop=face";

/// Split a compact token into its three segments.
fn split(token: &str) -> Result<[&str; 3], AuthError> {
    let parts: Vec<&str> = token.trim().split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::MalformedToken(format!(
            "expected 3 dot-separated parts, got {}",
            parts.len()
        )));
    }
    if parts[1].is_empty() {
        return Err(AuthError::MalformedToken("payload segment is empty".to_string()));
    }
    Ok([parts[0], parts[1], parts[2]])
}

/// The raw (still encoded) payload segment.
pub fn payload_segment(token: &str) -> Result<&str, AuthError> {
    Ok(split(token)?[1])
}

fn decode_segment_json(segment: &str, name: &'static str) -> Result<Value, AuthError> {
    let bytes = base64url_decode(segment).map_err(|e| AuthError::Encoding {
        segment: name,
        reason: e.to_string(),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| AuthError::Encoding {
        segment: name,
        reason: format!("invalid JSON: {}", e),
    })
}

/// Decode the payload of a token.
///
/// # Errors
/// - `MalformedToken` if the token is not three dot-separated segments
/// - `Encoding` if the payload is not base64url-encoded JSON
/// - `InvalidToken` if a required claim (`sub`, `iss`, `aud`) is absent
pub fn decode(token: &str) -> Result<JwtPayload, AuthError> {
    let [_, payload, _] = split(token)?;
    let value = decode_segment_json(payload, "payload")?;

    let obj = value.as_object().ok_or_else(|| AuthError::Encoding {
        segment: "payload",
        reason: "expected a JSON object".to_string(),
    })?;
    for claim in REQUIRED_CLAIMS {
        if !obj.contains_key(claim) {
            return Err(AuthError::InvalidToken(format!(
                "missing required claim {}",
                claim
            )));
        }
    }

    serde_json::from_value(value).map_err(|e| AuthError::Encoding {
        segment: "payload",
        reason: e.to_string(),
    })
}

/// Decode the header of a token.
pub fn decode_header(token: &str) -> Result<JwtHeader, AuthError> {
    let [header, _, _] = split(token)?;
    let value = decode_segment_json(header, "header")?;
    serde_json::from_value(value).map_err(|e| AuthError::Encoding {
        segment: "header",
        reason: e.to_string(),
    })
}

/// Decode and require non-empty `sub`, `iss`, and `aud`.
///
/// Decode errors pass through unchanged; empty required claims are `InvalidToken`.
pub fn ensure_structure(token: &str) -> Result<JwtPayload, AuthError> {
    let payload = decode(token)?;
    if payload.sub.is_empty() {
        return Err(AuthError::InvalidToken("empty sub claim".to_string()));
    }
    if payload.iss.is_empty() {
        return Err(AuthError::InvalidToken("empty iss claim".to_string()));
    }
    if payload.aud.is_empty() {
        return Err(AuthError::InvalidToken("empty aud claim".to_string()));
    }
    Ok(payload)
}

/// True iff the token decodes and carries non-empty required claims.
pub fn validate_structure(token: &str) -> bool {
    match ensure_structure(token) {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!(error = %e, "token failed structural validation");
            false
        }
    }
}

/// True if the token cannot be decoded or `exp` is before `now` (Unix seconds).
pub fn is_expired_at(token: &str, now: i64) -> bool {
    match decode(token) {
        Ok(payload) => payload.exp.is_some_and(|exp| exp < now),
        Err(_) => true,
    }
}

/// [`is_expired_at`] against the current clock.
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, chrono::Utc::now().timestamp())
}

/// The `iss` claim, or an empty string if the token does not decode.
pub fn issuer(token: &str) -> String {
    decode(token).map(|p| p.iss).unwrap_or_default()
}

/// Classify the issuing provider. Never fails.
pub fn issuer_to_provider(token: &str) -> ProviderId {
    decode(token)
        .map(|p| p.provider())
        .unwrap_or(ProviderId::Unknown)
}

/// Encode header and payload JSON as an unsigned compact token with the
/// given raw signature bytes.
pub fn encode_unsigned(header: &Value, payload: &Value, signature: &[u8]) -> Result<String, AuthError> {
    let header = base64url_encode(serde_json::to_string(header)?.as_bytes());
    let payload = base64url_encode(serde_json::to_string(payload)?.as_bytes());
    Ok(format!("{}.{}.{}", header, payload, base64url_encode(signature)))
}

fn synthetic_issuer(provider: ProviderId) -> (&'static str, &'static str) {
    match provider {
        ProviderId::Google => ("https://accounts.google.com", "demo-google-client-id"),
        ProviderId::Facebook => ("https://www.facebook.com", "demo-facebook-client-id"),
        ProviderId::Apple => ("https://appleid.apple.com", "demo-apple-client-id"),
        ProviderId::Unknown => ("https://login.demo.invalid", "demo-client-id"),
    }
}

/// Build an unsigned demo token for environments without a reachable provider.
///
/// The token goes through the same codec as real tokens: it is validated
/// before being returned and construction fails if validation does.
pub fn synthetic_token(
    provider: ProviderId,
    identity: &MockIdentity,
    nonce: &str,
    now: i64,
) -> Result<String, AuthError> {
    let (iss, aud) = synthetic_issuer(provider);
    let header = json!({
        "alg": "RS256",
        "typ": "JWT",
        "kid": "demo-key-id",
    });
    let payload = json!({
        "sub": identity.sub.as_deref().unwrap_or("1234567890"),
        "email": identity.email.as_deref().unwrap_or("user@example.com"),
        "name": identity.name.as_deref().unwrap_or("Demo User"),
        "picture": identity.picture.as_deref().unwrap_or(DEFAULT_PICTURE),
        "aud": aud,
        "iss": iss,
        "iat": now,
        "exp": now + SYNTHETIC_TOKEN_TTL_SECS,
        "nonce": nonce,
    });

    let token = encode_unsigned(&header, &payload, SYNTHETIC_SIGNATURE)?;
    ensure_structure(&token)?;
    Ok(token)
}
