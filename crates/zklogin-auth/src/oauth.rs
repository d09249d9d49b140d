//! OAuth provider configuration, authorization URLs, and token exchange payloads.
//!
//! HTTP is the caller's job. This module only builds the outbound redirect URL
//! and form body and interprets the provider's JSON response.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::{form_urlencoded, Url};

use crate::error::AuthError;
use crate::types::ProviderId;

/// Client id shipped in sample configuration; never valid.
pub const GOOGLE_PLACEHOLDER_CLIENT_ID: &str = "your-google-client-id.apps.googleusercontent.com";

/// Client id shipped in sample configuration; never valid.
pub const FACEBOOK_PLACEHOLDER_CLIENT_ID: &str = "your-facebook-client-id";

/// Path appended to the application origin to form the redirect URI.
pub const CALLBACK_PATH: &str = "/auth/callback";

const GOOGLE_CLIENT_ID_SUFFIX: &str = ".apps.googleusercontent.com";
const FACEBOOK_MIN_CLIENT_ID_LEN: usize = 10;

const GOOGLE_AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const FACEBOOK_AUTHORIZATION_ENDPOINT: &str = "https://www.facebook.com/v18.0/dialog/oauth";
const FACEBOOK_TOKEN_ENDPOINT: &str = "https://graph.facebook.com/v18.0/oauth/access_token";

/// Per-provider OAuth client settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider: ProviderId,
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub scopes: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
}

impl ProviderConfig {
    /// Google OpenID Connect with `openid email profile` scopes.
    pub fn google(client_id: impl Into<String>, redirect_origin: &str) -> Self {
        Self {
            provider: ProviderId::Google,
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri: redirect_uri(redirect_origin),
            scopes: "openid email profile".to_string(),
            authorization_endpoint: GOOGLE_AUTHORIZATION_ENDPOINT.to_string(),
            token_endpoint: GOOGLE_TOKEN_ENDPOINT.to_string(),
        }
    }

    /// Facebook Login with `openid email` scopes.
    pub fn facebook(client_id: impl Into<String>, redirect_origin: &str) -> Self {
        Self {
            provider: ProviderId::Facebook,
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri: redirect_uri(redirect_origin),
            scopes: "openid email".to_string(),
            authorization_endpoint: FACEBOOK_AUTHORIZATION_ENDPOINT.to_string(),
            token_endpoint: FACEBOOK_TOKEN_ENDPOINT.to_string(),
        }
    }

    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Check the client id is set and is not a sample placeholder.
    ///
    /// # Errors
    /// Returns `AuthError::Config` with remediation text.
    pub fn validate(&self) -> Result<(), AuthError> {
        let id = self.client_id.trim();
        if id.is_empty() {
            return Err(AuthError::Config(format!(
                "{} client id is not set; register an OAuth client with the provider and configure its id",
                self.provider
            )));
        }
        let valid = match self.provider {
            ProviderId::Google => {
                id != GOOGLE_PLACEHOLDER_CLIENT_ID && id.ends_with(GOOGLE_CLIENT_ID_SUFFIX)
            }
            ProviderId::Facebook => {
                id != FACEBOOK_PLACEHOLDER_CLIENT_ID && id.len() > FACEBOOK_MIN_CLIENT_ID_LEN
            }
            ProviderId::Apple | ProviderId::Unknown => true,
        };
        if !valid {
            return Err(AuthError::Config(format!(
                "{} client id {:?} is a placeholder or not a valid client id; replace it with the id issued by the provider",
                self.provider, id
            )));
        }
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.validate().is_ok()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

fn redirect_uri(origin: &str) -> String {
    format!("{}{}", origin.trim_end_matches('/'), CALLBACK_PATH)
}

/// Which providers are usable, with one message per misconfigured provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationStatus {
    pub google: bool,
    pub facebook: bool,
    pub errors: Vec<String>,
}

/// Validate the Google and Facebook client configuration together.
pub fn validate_oauth_config(google: &ProviderConfig, facebook: &ProviderConfig) -> ConfigurationStatus {
    let mut errors = Vec::new();
    let google_ok = match google.validate() {
        Ok(()) => true,
        Err(e) => {
            errors.push(e.to_string());
            false
        }
    };
    let facebook_ok = match facebook.validate() {
        Ok(()) => true,
        Err(e) => {
            errors.push(e.to_string());
            false
        }
    };
    ConfigurationStatus {
        google: google_ok,
        facebook: facebook_ok,
        errors,
    }
}

/// Build the provider authorization URL carrying the bound nonce.
///
/// Google additionally gets `access_type=offline` and `prompt=consent`.
pub fn build_auth_url(config: &ProviderConfig, nonce: &str) -> Result<Url, AuthError> {
    config.validate()?;

    let mut url = Url::parse(&config.authorization_endpoint)?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("client_id", &config.client_id)
            .append_pair("redirect_uri", &config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &config.scopes)
            .append_pair("nonce", nonce);
        if config.provider == ProviderId::Google {
            query
                .append_pair("access_type", "offline")
                .append_pair("prompt", "consent");
        }
    }
    Ok(url)
}

/// Authorization-code exchange request (`application/x-www-form-urlencoded`).
#[derive(Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub token_endpoint: String,
    pub client_id: String,
    pub client_secret: String,
    pub code: String,
    pub redirect_uri: String,
}

impl TokenRequest {
    pub fn new(config: &ProviderConfig, code: &str) -> Self {
        Self {
            token_endpoint: config.token_endpoint.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone().unwrap_or_default(),
            code: code.to_string(),
            redirect_uri: config.redirect_uri.clone(),
        }
    }

    pub fn form_body(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", &self.client_id)
            .append_pair("client_secret", &self.client_secret)
            .append_pair("code", &self.code)
            .append_pair("grant_type", "authorization_code")
            .append_pair("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

impl std::fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRequest")
            .field("token_endpoint", &self.token_endpoint)
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .finish_non_exhaustive()
    }
}

/// Extract the `id_token` from a token endpoint JSON response.
///
/// Accepts both the OAuth 2.0 form (`error` + `error_description` strings) and
/// the Graph API form (`error: { message }`).
pub fn parse_token_response(json: &Value) -> Result<String, AuthError> {
    if let Some(error) = json.get("error") {
        let message = match error {
            Value::String(code) => json
                .get("error_description")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .unwrap_or(code.as_str())
                .to_string(),
            Value::Object(obj) => obj
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error")
                .to_string(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        if !message.is_empty() {
            return Err(AuthError::TokenRejected(message));
        }
    }

    match json.get("id_token").and_then(|v| v.as_str()) {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(AuthError::MissingIdToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const GOOGLE_ID: &str = "1234-abc.apps.googleusercontent.com";

    fn google() -> ProviderConfig {
        ProviderConfig::google(GOOGLE_ID, "https://app.example.com/")
    }

    fn query(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn redirect_uri_appends_callback_path() {
        assert_eq!(google().redirect_uri, "https://app.example.com/auth/callback");
    }

    #[test]
    fn google_url_carries_all_parameters() {
        let nonce = "a".repeat(64);
        let url = build_auth_url(&google(), &nonce).unwrap();
        assert!(url
            .as_str()
            .starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));

        let pairs = query(&url);
        let get = |k: &str| {
            pairs
                .iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("client_id"), Some(GOOGLE_ID));
        assert_eq!(get("redirect_uri"), Some("https://app.example.com/auth/callback"));
        assert_eq!(get("response_type"), Some("code"));
        assert_eq!(get("scope"), Some("openid email profile"));
        assert_eq!(get("nonce"), Some(nonce.as_str()));
        assert_eq!(get("access_type"), Some("offline"));
        assert_eq!(get("prompt"), Some("consent"));
    }

    #[test]
    fn facebook_url_omits_google_only_parameters() {
        let config = ProviderConfig::facebook("123456789012345", "https://app.example.com");
        let url = build_auth_url(&config, "n").unwrap();
        let keys: Vec<String> = query(&url).into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec!["client_id", "redirect_uri", "response_type", "scope", "nonce"]
        );
    }

    #[test]
    fn placeholder_client_ids_are_config_errors() {
        let config = ProviderConfig::google(GOOGLE_PLACEHOLDER_CLIENT_ID, "http://localhost");
        assert!(matches!(
            build_auth_url(&config, "n"),
            Err(AuthError::Config(_))
        ));

        let config = ProviderConfig::google("", "http://localhost");
        let err = build_auth_url(&config, "n").unwrap_err();
        assert!(err.to_string().contains("not set"));

        let config = ProviderConfig::google("not-a-google-id", "http://localhost");
        assert!(config.validate().is_err());

        let config = ProviderConfig::facebook(FACEBOOK_PLACEHOLDER_CLIENT_ID, "http://localhost");
        assert!(config.validate().is_err());

        let config = ProviderConfig::facebook("short", "http://localhost");
        assert!(config.validate().is_err());
    }

    #[test]
    fn configuration_status_reports_each_provider() {
        let status = validate_oauth_config(
            &google(),
            &ProviderConfig::facebook(FACEBOOK_PLACEHOLDER_CLIENT_ID, "http://localhost"),
        );
        assert!(status.google);
        assert!(!status.facebook);
        assert_eq!(status.errors.len(), 1);
        assert!(status.errors[0].contains("facebook"));
    }

    #[test]
    fn token_request_form_body() {
        let request = TokenRequest::new(&google().with_client_secret("s3cret"), "4/0Ab+c d");
        let pairs: Vec<(String, String)> = form_urlencoded::parse(request.form_body().as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("client_id".to_string(), GOOGLE_ID.to_string()),
                ("client_secret".to_string(), "s3cret".to_string()),
                ("code".to_string(), "4/0Ab+c d".to_string()),
                ("grant_type".to_string(), "authorization_code".to_string()),
                (
                    "redirect_uri".to_string(),
                    "https://app.example.com/auth/callback".to_string()
                ),
            ]
        );
        assert_eq!(request.token_endpoint, "https://oauth2.googleapis.com/token");
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = google().with_client_secret("s3cret");
        assert!(!format!("{:?}", config).contains("s3cret"));
        let request = TokenRequest::new(&config, "the-code");
        let debug = format!("{:?}", request);
        assert!(!debug.contains("s3cret"));
        assert!(!debug.contains("the-code"));
    }

    #[test]
    fn token_response_with_id_token() {
        let token = parse_token_response(&json!({"id_token": "a.b.c", "access_token": "x"})).unwrap();
        assert_eq!(token, "a.b.c");
    }

    #[test]
    fn token_response_error_prefers_description() {
        let err = parse_token_response(&json!({
            "error": "invalid_grant",
            "error_description": "Bad Request"
        }))
        .unwrap_err();
        assert!(matches!(err, AuthError::TokenRejected(ref m) if m == "Bad Request"));

        let err = parse_token_response(&json!({"error": "invalid_grant"})).unwrap_err();
        assert!(matches!(err, AuthError::TokenRejected(ref m) if m == "invalid_grant"));
    }

    #[test]
    fn token_response_graph_error_object() {
        let err = parse_token_response(&json!({
            "error": {"message": "Invalid verification code format.", "code": 100}
        }))
        .unwrap_err();
        assert!(matches!(err, AuthError::TokenRejected(ref m) if m.contains("verification code")));
    }

    #[test]
    fn token_response_without_id_token() {
        assert!(matches!(
            parse_token_response(&json!({"access_token": "x"})),
            Err(AuthError::MissingIdToken)
        ));
        assert!(matches!(
            parse_token_response(&json!({"id_token": ""})),
            Err(AuthError::MissingIdToken)
        ));
    }
}
