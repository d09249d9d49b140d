use thiserror::Error;
use zklogin_auth::AuthError;

use crate::orchestrator::LoginState;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage write failed for {key}: {reason}")]
    WriteFailed { key: String, reason: String },

    #[error("Record encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Login initialization failed: {0}")]
    Initialization(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Cannot {operation} while {state}")]
    InvalidState {
        state: LoginState,
        operation: &'static str,
    },

    #[error("No login attempt is pending")]
    NoPendingAttempt,

    #[error("Salt lookup failed: {0}")]
    Salt(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl LoginError {
    /// Whether the user can reasonably retry the same operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LoginError::Initialization(_)
                | LoginError::TokenExchange(_)
                | LoginError::Salt(_)
                | LoginError::Store(StoreError::Unavailable(_))
        )
    }

    /// Whether the failure comes from missing or placeholder OAuth configuration.
    pub fn is_config(&self) -> bool {
        matches!(self, LoginError::Auth(AuthError::Config(_)))
    }
}

/// Error reported by a caller-supplied collaborator (token exchange, epoch
/// lookup, salt service).
#[derive(Debug, Clone)]
pub struct ExternalError {
    pub message: String,
    pub kind: ExternalErrorKind,
}

impl ExternalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ExternalErrorKind::Transient,
        }
    }

    pub fn with_kind(message: impl Into<String>, kind: ExternalErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

impl std::fmt::Display for ExternalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExternalError {}

/// Classification of collaborator failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalErrorKind {
    /// Network or temporary failure
    Transient,
    /// Rejected request; retrying unchanged will not help
    Permanent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_kinds() {
        assert!(LoginError::Initialization("rng".into()).is_retryable());
        assert!(LoginError::TokenExchange("timeout".into()).is_retryable());
        assert!(!LoginError::Auth(AuthError::MalformedToken("x".into())).is_retryable());
        assert!(!LoginError::Auth(AuthError::NonceMismatch {
            expected: "a".into(),
            got: None
        })
        .is_retryable());
    }

    #[test]
    fn config_errors_are_flagged() {
        let err = LoginError::from(AuthError::Config("placeholder".into()));
        assert!(err.is_config());
        assert!(!err.is_retryable());
    }

    #[test]
    fn auth_errors_display_transparently() {
        let err = LoginError::from(AuthError::MissingClaim("sub".into()));
        assert_eq!(err.to_string(), "JWT does not contain sub claim");
    }

    #[test]
    fn external_error_defaults_to_transient() {
        let err = ExternalError::new("connection reset");
        assert_eq!(err.kind, ExternalErrorKind::Transient);
        assert_eq!(err.to_string(), "connection reset");
    }
}
