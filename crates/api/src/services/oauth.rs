//! Social login (OAuth 2.0 authorization code flow) for Google and Naver.
//!
//! The server stays stateless: the CSRF `state` travels in a short-lived
//! cookie set by the authorization redirect and is compared on callback.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::{OAuthClientConfig, OAuthConfig};
use crate::services::auth::OAuthIdentity;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const STATE_LENGTH: usize = 32;

/// Errors from the OAuth flow.
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("unknown OAuth provider: {0}")]
    UnknownProvider(String),

    #[error("OAuth provider {0} is not configured")]
    NotConfigured(&'static str),

    #[error("OAuth state mismatch")]
    StateMismatch,

    #[error("provider denied authorization: {0}")]
    Denied(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("user info request failed: {0}")]
    UserInfo(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Supported login providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Naver,
}

impl OAuthProvider {
    /// Provider name as used in URLs and stored on the user row.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Naver => "naver",
        }
    }

    const fn authorize_url(self) -> &'static str {
        match self {
            Self::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            Self::Naver => "https://nid.naver.com/oauth2.0/authorize",
        }
    }

    const fn token_url(self) -> &'static str {
        match self {
            Self::Google => "https://oauth2.googleapis.com/token",
            Self::Naver => "https://nid.naver.com/oauth2.0/token",
        }
    }

    const fn user_info_url(self) -> &'static str {
        match self {
            Self::Google => "https://openidconnect.googleapis.com/v1/userinfo",
            Self::Naver => "https://openapi.naver.com/v1/nid/me",
        }
    }

    const fn scope(self) -> Option<&'static str> {
        match self {
            Self::Google => Some("openid email profile"),
            Self::Naver => None,
        }
    }
}

impl std::str::FromStr for OAuthProvider {
    type Err = OAuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Self::Google),
            "naver" => Ok(Self::Naver),
            other => Err(OAuthError::UnknownProvider(other.to_owned())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NaverUserInfo {
    response: NaverProfile,
}

#[derive(Debug, Deserialize)]
struct NaverProfile {
    id: String,
    email: Option<String>,
    name: Option<String>,
}

/// OAuth client for all configured providers.
#[derive(Clone)]
pub struct OAuthClient {
    inner: Arc<OAuthClientInner>,
}

struct OAuthClientInner {
    client: reqwest::Client,
    config: OAuthConfig,
    base_url: String,
}

impl OAuthClient {
    /// Create a new OAuth client.
    ///
    /// `base_url` is this API's public URL; callbacks land on
    /// `{base_url}/login/oauth2/code/{provider}`.
    #[must_use]
    pub fn new(config: &OAuthConfig, base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            inner: Arc::new(OAuthClientInner {
                client,
                config: config.clone(),
                base_url: base_url.trim_end_matches('/').to_owned(),
            }),
        }
    }

    /// Callback URL registered with the provider.
    #[must_use]
    pub fn redirect_uri(&self, provider: OAuthProvider) -> String {
        format!(
            "{}/login/oauth2/code/{}",
            self.inner.base_url,
            provider.as_str()
        )
    }

    /// Build the provider authorization URL for a given state.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::NotConfigured` if the provider has no credentials.
    pub fn authorization_url(
        &self,
        provider: OAuthProvider,
        state: &str,
    ) -> Result<String, OAuthError> {
        let credentials = self.credentials(provider)?;
        let mut url = format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&state={}",
            provider.authorize_url(),
            urlencoding::encode(&credentials.client_id),
            urlencoding::encode(&self.redirect_uri(provider)),
            urlencoding::encode(state)
        );
        if let Some(scope) = provider.scope() {
            url.push_str("&scope=");
            url.push_str(&urlencoding::encode(scope));
        }
        Ok(url)
    }

    /// Exchange the authorization code and fetch the user's identity.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError` if the provider is not configured, the exchange
    /// fails or the user-info response lacks an email.
    #[instrument(skip(self, provider, code, state), fields(provider = provider.as_str()))]
    pub async fn fetch_identity(
        &self,
        provider: OAuthProvider,
        code: &str,
        state: &str,
    ) -> Result<OAuthIdentity, OAuthError> {
        let access_token = self.exchange_code(provider, code, state).await?;

        let response = self
            .inner
            .client
            .get(provider.user_info_url())
            .bearer_auth(&access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(OAuthError::UserInfo(format!("status {status}")));
        }
        let body = response.text().await?;

        parse_identity(provider, &body)
    }

    async fn exchange_code(
        &self,
        provider: OAuthProvider,
        code: &str,
        state: &str,
    ) -> Result<String, OAuthError> {
        let credentials = self.credentials(provider)?;
        let redirect_uri = self.redirect_uri(provider);
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", redirect_uri.as_str()),
            ("state", state),
        ];

        let response = self
            .inner
            .client
            .post(provider.token_url())
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(OAuthError::TokenExchange(text));
        }

        let token: TokenResponse = response.json().await?;
        if let Some(error) = token.error {
            let description = token.error_description.unwrap_or_default();
            return Err(OAuthError::TokenExchange(format!("{error}: {description}")));
        }
        token
            .access_token
            .ok_or_else(|| OAuthError::TokenExchange("no access token".to_owned()))
    }

    fn credentials(&self, provider: OAuthProvider) -> Result<&OAuthClientConfig, OAuthError> {
        let credentials = match provider {
            OAuthProvider::Google => self.inner.config.google.as_ref(),
            OAuthProvider::Naver => self.inner.config.naver.as_ref(),
        };
        credentials.ok_or(OAuthError::NotConfigured(provider.as_str()))
    }

    /// Whether the provider has credentials configured.
    #[must_use]
    pub fn is_enabled(&self, provider: OAuthProvider) -> bool {
        self.credentials(provider).is_ok()
    }
}

/// Map a provider's user-info body to an identity.
fn parse_identity(provider: OAuthProvider, body: &str) -> Result<OAuthIdentity, OAuthError> {
    let (provider_id, email, name) = match provider {
        OAuthProvider::Google => {
            let info: GoogleUserInfo =
                serde_json::from_str(body).map_err(|e| OAuthError::UserInfo(e.to_string()))?;
            (info.sub, info.email, info.name)
        }
        OAuthProvider::Naver => {
            let info: NaverUserInfo =
                serde_json::from_str(body).map_err(|e| OAuthError::UserInfo(e.to_string()))?;
            (info.response.id, info.response.email, info.response.name)
        }
    };

    let email = email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| OAuthError::UserInfo("provider returned no email".to_owned()))?;

    Ok(OAuthIdentity {
        provider: provider.as_str(),
        provider_id,
        email,
        name,
    })
}

/// Generate a random alphanumeric CSRF state.
#[must_use]
pub fn generate_state() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..STATE_LENGTH)
        .filter_map(|_| CHARSET.get(rng.random_range(0..CHARSET.len())).copied())
        .map(char::from)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn client() -> OAuthClient {
        OAuthClient::new(
            &OAuthConfig {
                google: Some(OAuthClientConfig {
                    client_id: "google-client".to_owned(),
                    client_secret: SecretString::from("google-secret"),
                }),
                naver: None,
            },
            "http://localhost:8080/",
        )
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("google".parse::<OAuthProvider>().unwrap(), OAuthProvider::Google);
        assert_eq!("naver".parse::<OAuthProvider>().unwrap(), OAuthProvider::Naver);
        assert!(matches!(
            "kakao".parse::<OAuthProvider>(),
            Err(OAuthError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_authorization_url() {
        let url = client()
            .authorization_url(OAuthProvider::Google, "abc123")
            .unwrap();

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=google-client"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Flogin%2Foauth2%2Fcode%2Fgoogle"
        ));
        assert!(url.contains("state=abc123"));
        assert!(url.contains("scope=openid%20email%20profile"));
    }

    #[test]
    fn test_unconfigured_provider() {
        let client = client();
        assert!(!client.is_enabled(OAuthProvider::Naver));
        assert!(matches!(
            client.authorization_url(OAuthProvider::Naver, "s"),
            Err(OAuthError::NotConfigured("naver"))
        ));
    }

    #[test]
    fn test_parse_google_identity() {
        let identity = parse_identity(
            OAuthProvider::Google,
            r#"{"sub":"1234","email":"a@gmail.com","name":"Alex"}"#,
        )
        .unwrap();
        assert_eq!(identity.provider, "google");
        assert_eq!(identity.provider_id, "1234");
        assert_eq!(identity.email, "a@gmail.com");
        assert_eq!(identity.name.as_deref(), Some("Alex"));
    }

    #[test]
    fn test_parse_naver_identity() {
        let identity = parse_identity(
            OAuthProvider::Naver,
            r#"{"resultcode":"00","message":"success",
                "response":{"id":"n-9","email":"b@naver.com","name":"Bora"}}"#,
        )
        .unwrap();
        assert_eq!(identity.provider, "naver");
        assert_eq!(identity.provider_id, "n-9");
        assert_eq!(identity.email, "b@naver.com");
    }

    #[test]
    fn test_parse_identity_requires_email() {
        let result = parse_identity(OAuthProvider::Google, r#"{"sub":"1234"}"#);
        assert!(matches!(result, Err(OAuthError::UserInfo(_))));
    }

    #[test]
    fn test_generate_state() {
        let state = generate_state();
        assert_eq!(state.len(), STATE_LENGTH);
        assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(state, generate_state());
    }
}
