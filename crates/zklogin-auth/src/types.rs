use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::AuthError;

/// Claims every identity token must carry.
pub const REQUIRED_CLAIMS: [&str; 3] = ["sub", "iss", "aud"];

/// OAuth identity provider, classified from the token issuer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Google,
    Facebook,
    Apple,
    Unknown,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Google => "google",
            ProviderId::Facebook => "facebook",
            ProviderId::Apple => "apple",
            ProviderId::Unknown => "unknown",
        }
    }

    /// Substring match against the known issuer hosts.
    pub fn from_issuer(issuer: &str) -> Self {
        if issuer.contains("accounts.google.com") {
            ProviderId::Google
        } else if issuer.contains("facebook.com") {
            ProviderId::Facebook
        } else if issuer.contains("apple.com") {
            ProviderId::Apple
        } else {
            ProviderId::Unknown
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderId {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(ProviderId::Google),
            "facebook" => Ok(ProviderId::Facebook),
            "apple" => Ok(ProviderId::Apple),
            "unknown" => Ok(ProviderId::Unknown),
            other => Err(AuthError::Config(format!("unknown provider {:?}", other))),
        }
    }
}

/// The `aud` claim: a single client id or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    pub fn is_empty(&self) -> bool {
        match self {
            Audience::Single(aud) => aud.is_empty(),
            Audience::Multiple(auds) => auds.iter().all(|a| a.is_empty()),
        }
    }

    pub fn contains(&self, client_id: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == client_id,
            Audience::Multiple(auds) => auds.iter().any(|a| a == client_id),
        }
    }

    /// First non-empty audience value.
    pub fn primary(&self) -> Option<&str> {
        match self {
            Audience::Single(aud) if !aud.is_empty() => Some(aud),
            Audience::Single(_) => None,
            Audience::Multiple(auds) => auds.iter().find(|a| !a.is_empty()).map(|a| a.as_str()),
        }
    }
}

/// Decoded JWT header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

/// Decoded JWT payload. Claims without a dedicated field land in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwtPayload {
    pub sub: String,
    pub iss: String,
    pub aud: Audience,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub email: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "picture_url",
        skip_serializing_if = "Option::is_none"
    )]
    pub picture: Option<String>,
    #[serde(
        default,
        deserialize_with = "numeric_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub exp: Option<i64>,
    #[serde(
        default,
        deserialize_with = "numeric_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub iat: Option<i64>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub nonce: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// Optional claims never fail decoding: a value of the wrong type reads as absent.

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// A plain URL, or the Graph API shape `{"data": {"url": ...}}`.
fn picture_url<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Object(obj) => obj
            .get("data")
            .and_then(|data| data.get("url"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    })
}

/// RFC 7519 NumericDate: seconds, possibly fractional. Truncated to whole seconds.
fn numeric_date<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.floor() as i64)
        }),
        _ => None,
    })
}

impl JwtPayload {
    /// Look up a claim by name as a string. Numeric claims are rendered in decimal.
    pub fn claim(&self, name: &str) -> Option<String> {
        match name {
            "sub" => Some(self.sub.clone()),
            "iss" => Some(self.iss.clone()),
            "aud" => self.aud.primary().map(str::to_string),
            "email" => self.email.clone(),
            "name" => self.name.clone(),
            "picture" => self.picture.clone(),
            "nonce" => self.nonce.clone(),
            "exp" => self.exp.map(|v| v.to_string()),
            "iat" => self.iat.map(|v| v.to_string()),
            other => match self.extra.get(other)? {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            },
        }
    }

    pub fn provider(&self) -> ProviderId {
        ProviderId::from_issuer(&self.iss)
    }

    fn extra_str(&self, name: &str) -> Option<String> {
        self.extra
            .get(name)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// Profile details surfaced to the UI after authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub provider: ProviderId,
}

impl UserInfo {
    /// Extract profile fields, falling back to the alternative claim names
    /// some providers use (`given_name`, `family_name`, `avatar_url`).
    pub fn from_payload(payload: &JwtPayload) -> Self {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        Self {
            email: non_empty(&payload.email),
            name: non_empty(&payload.name)
                .or_else(|| payload.extra_str("given_name"))
                .or_else(|| payload.extra_str("family_name")),
            picture: non_empty(&payload.picture).or_else(|| payload.extra_str("avatar_url")),
            provider: payload.provider(),
        }
    }
}

/// Identity fed to the synthetic token constructor. Unset fields take defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl MockIdentity {
    pub fn new(sub: impl Into<String>) -> Self {
        Self {
            sub: Some(sub.into()),
            ..Default::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_picture(mut self, picture: impl Into<String>) -> Self {
        self.picture = Some(picture.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> JwtPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn provider_from_issuer() {
        assert_eq!(
            ProviderId::from_issuer("https://accounts.google.com"),
            ProviderId::Google
        );
        assert_eq!(
            ProviderId::from_issuer("https://www.facebook.com"),
            ProviderId::Facebook
        );
        assert_eq!(
            ProviderId::from_issuer("https://appleid.apple.com"),
            ProviderId::Apple
        );
        assert_eq!(
            ProviderId::from_issuer("https://login.example.org"),
            ProviderId::Unknown
        );
    }

    #[test]
    fn provider_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(ProviderId::Google).unwrap(),
            json!("google")
        );
        assert_eq!("Facebook".parse::<ProviderId>().unwrap(), ProviderId::Facebook);
        assert!("myspace".parse::<ProviderId>().is_err());
    }

    #[test]
    fn audience_accepts_string_or_array() {
        let single = payload(json!({"sub": "s", "iss": "i", "aud": "client"}));
        assert_eq!(single.aud, Audience::Single("client".into()));
        assert!(single.aud.contains("client"));

        let multi = payload(json!({"sub": "s", "iss": "i", "aud": ["", "b"]}));
        assert_eq!(multi.aud.primary(), Some("b"));
        assert!(!multi.aud.is_empty());
        assert!(Audience::Multiple(vec![]).is_empty());
    }

    #[test]
    fn unknown_claims_kept_in_extra() {
        let p = payload(json!({
            "sub": "s", "iss": "i", "aud": "a",
            "email_verified": true, "hd": "example.com", "auth_time": 42
        }));
        assert_eq!(p.extra.get("email_verified"), Some(&json!(true)));
        assert_eq!(p.claim("hd").as_deref(), Some("example.com"));
        assert_eq!(p.claim("auth_time").as_deref(), Some("42"));
        assert_eq!(p.claim("email_verified"), None);
        assert_eq!(p.claim("missing"), None);
    }

    #[test]
    fn user_info_prefers_standard_claims() {
        let p = payload(json!({
            "sub": "s", "iss": "https://accounts.google.com", "aud": "a",
            "email": "a@b.c", "name": "Ada", "given_name": "A", "picture": "https://p"
        }));
        let info = UserInfo::from_payload(&p);
        assert_eq!(info.email.as_deref(), Some("a@b.c"));
        assert_eq!(info.name.as_deref(), Some("Ada"));
        assert_eq!(info.picture.as_deref(), Some("https://p"));
        assert_eq!(info.provider, ProviderId::Google);
    }

    #[test]
    fn user_info_falls_back_to_alternative_claims() {
        let p = payload(json!({
            "sub": "s", "iss": "https://www.facebook.com", "aud": "a",
            "name": "", "family_name": "Lovelace", "avatar_url": "https://avatar"
        }));
        let info = UserInfo::from_payload(&p);
        assert_eq!(info.email, None);
        assert_eq!(info.name.as_deref(), Some("Lovelace"));
        assert_eq!(info.picture.as_deref(), Some("https://avatar"));
        assert_eq!(info.provider, ProviderId::Facebook);
    }
}
