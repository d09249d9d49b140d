use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("OAuth configuration error: {0}")]
    Config(String),

    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Token encoding error in {segment} segment: {reason}")]
    Encoding {
        segment: &'static str,
        reason: String,
    },

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("JWT does not contain {0} claim")]
    MissingClaim(String),

    #[error("Nonce mismatch: expected {expected}, token carries {got:?}")]
    NonceMismatch {
        expected: String,
        got: Option<String>,
    },

    #[error("Token exchange rejected by provider: {0}")]
    TokenRejected(String),

    #[error("Token response contained no id_token")]
    MissingIdToken,

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Crypto error: {0}")]
    Crypto(#[from] zklogin_crypto::CryptoError),
}
