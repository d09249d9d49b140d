//! Login configuration: orchestrator options and OAuth provider settings.
//!
//! Provider settings are read from the environment. Unset client ids fall back
//! to the sample placeholders so that validation reports them instead of the
//! flow failing later at the provider.

use zklogin_auth::{
    validate_oauth_config, ConfigurationStatus, ProviderConfig, ProviderId, DEFAULT_KEY_CLAIM,
    FACEBOOK_PLACEHOLDER_CLIENT_ID, GOOGLE_PLACEHOLDER_CLIENT_ID,
};

pub const GOOGLE_CLIENT_ID_ENV: &str = "ZKLOGIN_GOOGLE_CLIENT_ID";
pub const GOOGLE_CLIENT_SECRET_ENV: &str = "ZKLOGIN_GOOGLE_CLIENT_SECRET";
pub const FACEBOOK_CLIENT_ID_ENV: &str = "ZKLOGIN_FACEBOOK_CLIENT_ID";
pub const FACEBOOK_CLIENT_SECRET_ENV: &str = "ZKLOGIN_FACEBOOK_CLIENT_SECRET";
pub const REDIRECT_ORIGIN_ENV: &str = "ZKLOGIN_REDIRECT_ORIGIN";

pub const DEFAULT_REDIRECT_ORIGIN: &str = "http://localhost:5173";

/// Epochs added to the current epoch to get the key's max epoch.
pub const DEFAULT_EPOCH_BUFFER: u64 = 10;

/// Tunables for `LoginOrchestrator`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOptions {
    /// `max_epoch = current_epoch + epoch_buffer` (default: 10)
    pub epoch_buffer: u64,
    /// Claim the address is derived from (default: `sub`)
    pub key_claim_name: String,
}

impl Default for LoginOptions {
    fn default() -> Self {
        Self {
            epoch_buffer: DEFAULT_EPOCH_BUFFER,
            key_claim_name: DEFAULT_KEY_CLAIM.to_string(),
        }
    }
}

/// OAuth client settings for every supported provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub google: ProviderConfig,
    pub facebook: ProviderConfig,
}

impl ProviderSettings {
    /// Read `ZKLOGIN_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let origin = get(REDIRECT_ORIGIN_ENV).unwrap_or_else(|| DEFAULT_REDIRECT_ORIGIN.to_string());

        let mut google = ProviderConfig::google(
            get(GOOGLE_CLIENT_ID_ENV).unwrap_or_else(|| GOOGLE_PLACEHOLDER_CLIENT_ID.to_string()),
            &origin,
        );
        if let Some(secret) = get(GOOGLE_CLIENT_SECRET_ENV) {
            google = google.with_client_secret(secret);
        }

        let mut facebook = ProviderConfig::facebook(
            get(FACEBOOK_CLIENT_ID_ENV).unwrap_or_else(|| FACEBOOK_PLACEHOLDER_CLIENT_ID.to_string()),
            &origin,
        );
        if let Some(secret) = get(FACEBOOK_CLIENT_SECRET_ENV) {
            facebook = facebook.with_client_secret(secret);
        }

        tracing::debug!(
            google_configured = google.is_configured(),
            facebook_configured = facebook.is_configured(),
            "loaded provider settings"
        );
        Self { google, facebook }
    }

    pub fn get(&self, provider: ProviderId) -> Option<&ProviderConfig> {
        match provider {
            ProviderId::Google => Some(&self.google),
            ProviderId::Facebook => Some(&self.facebook),
            ProviderId::Apple | ProviderId::Unknown => None,
        }
    }

    pub fn status(&self) -> ConfigurationStatus {
        validate_oauth_config(&self.google, &self.facebook)
    }
}
