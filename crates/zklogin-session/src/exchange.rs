//! Authorization-code exchange boundary.

use async_trait::async_trait;
use serde_json::Value;
use zklogin_auth::TokenRequest;

use crate::error::ExternalError;

/// User-implemented network layer for the token endpoint.
///
/// Implementations POST `request.form_body()` to `request.token_endpoint` as
/// `application/x-www-form-urlencoded` and return the decoded JSON body, error
/// responses included. Transport failures are reported as `ExternalError`.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    async fn exchange(&self, request: &TokenRequest) -> Result<Value, ExternalError>;
}
