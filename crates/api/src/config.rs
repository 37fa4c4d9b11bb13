//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MODISH_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `MODISH_JWT_SECRET` - HMAC signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `MODISH_HOST` - Bind address (default: 127.0.0.1)
//! - `MODISH_PORT` - Listen port (default: 8080)
//! - `MODISH_BASE_URL` - Public URL of this API, used for OAuth redirect URIs
//! - `MODISH_FRONTEND_URL` - Frontend URL that OAuth logins return to
//! - `MODISH_CORS_ORIGINS` - Comma-separated allowed origins
//! - `MODISH_ACCESS_TOKEN_TTL_SECS` - Access token lifetime (default: 3600)
//! - `MODISH_REFRESH_TOKEN_TTL_SECS` - Refresh token lifetime (default: 604800)
//! - `MODISH_COOKIE_SECURE` - Mark auth cookies `Secure` (default: false)
//! - `MODISH_UPLOAD_DIR` - Upload root directory (default: uploads)
//! - `MODISH_MAX_UPLOAD_BYTES` - Per-file upload limit (default: 10 MiB)
//! - `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` - Google login
//! - `NAVER_CLIENT_ID` / `NAVER_CLIENT_SECRET` - Naver login
//! - `TOSS_SECRET_KEY` / `TOSS_API_URL` - Payment gateway
//! - `OPENAI_API_KEY` / `OPENAI_API_URL` / `OPENAI_MODEL` - AI chat relay
//! - `SENTRY_DSN` / `SENTRY_ENVIRONMENT` - Sentry error tracking

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
pub(crate) const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of this API
    pub base_url: String,
    /// Frontend URL (OAuth success/failure redirects land here)
    pub frontend_url: String,
    /// Origins allowed by CORS (credentials are allowed)
    pub cors_origins: Vec<String>,
    /// Token signing and cookie settings
    pub jwt: JwtConfig,
    /// Upload storage settings
    pub upload: UploadConfig,
    /// Social login providers
    pub oauth: OAuthConfig,
    /// Payment gateway settings
    pub payment: PaymentConfig,
    /// AI chat relay settings
    pub ai: AiConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Token signing configuration.
///
/// Implements `Debug` manually to redact the secret.
#[derive(Clone)]
pub struct JwtConfig {
    /// HMAC secret used to sign access and refresh tokens
    pub secret: SecretString,
    /// Access token lifetime
    pub access_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_ttl: Duration,
    /// Whether auth cookies carry the `Secure` attribute
    pub cookie_secure: bool,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

/// Upload storage configuration.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Root directory; `board/`, `product/` and `banner/` live beneath it
    pub dir: PathBuf,
    /// Maximum size of one uploaded file in bytes
    pub max_file_bytes: u64,
}

/// Credentials for one OAuth provider.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct OAuthClientConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
}

impl std::fmt::Debug for OAuthClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Social login configuration. A provider is enabled when both its ID and
/// secret are set.
#[derive(Debug, Clone, Default)]
pub struct OAuthConfig {
    /// Google login
    pub google: Option<OAuthClientConfig>,
    /// Naver login
    pub naver: Option<OAuthClientConfig>,
}

/// Payment gateway configuration.
#[derive(Clone)]
pub struct PaymentConfig {
    /// Gateway secret key; payment endpoints answer 503 without it
    pub secret_key: Option<SecretString>,
    /// Gateway base URL
    pub api_url: String,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// AI chat relay configuration.
#[derive(Clone)]
pub struct AiConfig {
    /// API key; without it the relay always answers with the fallback message
    pub api_key: Option<SecretString>,
    /// API base URL
    pub api_url: String,
    /// Chat model name
    pub model: String,
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the JWT secret fails validation (length, placeholder, entropy).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("MODISH_DATABASE_URL")?;
        let host = parse_env("MODISH_HOST", "127.0.0.1")?;
        let port = parse_env("MODISH_PORT", "8080")?;
        let base_url = get_env_or_default("MODISH_BASE_URL", "http://localhost:8080");
        let frontend_url = get_env_or_default("MODISH_FRONTEND_URL", "http://localhost:3000");
        let cors_origins = parse_origins(&get_env_or_default(
            "MODISH_CORS_ORIGINS",
            "http://localhost:3000,http://localhost:5173",
        ));

        let jwt = JwtConfig::from_env()?;
        let upload = UploadConfig::from_env()?;
        let oauth = OAuthConfig::from_env();
        let payment = PaymentConfig::from_env();
        let ai = AiConfig::from_env();

        Ok(Self {
            database_url,
            host,
            port,
            base_url: base_url.trim_end_matches('/').to_owned(),
            frontend_url: frontend_url.trim_end_matches('/').to_owned(),
            cors_origins,
            jwt,
            upload,
            oauth,
            payment,
            ai,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = get_validated_secret("MODISH_JWT_SECRET")?;
        validate_secret_length(&secret, "MODISH_JWT_SECRET")?;
        let access_secs: u64 = parse_env("MODISH_ACCESS_TOKEN_TTL_SECS", "3600")?;
        let refresh_secs: u64 = parse_env("MODISH_REFRESH_TOKEN_TTL_SECS", "604800")?;
        let cookie_secure = parse_env("MODISH_COOKIE_SECURE", "false")?;

        Ok(Self {
            secret,
            access_ttl: Duration::from_secs(access_secs),
            refresh_ttl: Duration::from_secs(refresh_secs),
            cookie_secure,
        })
    }
}

impl UploadConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            dir: PathBuf::from(get_env_or_default("MODISH_UPLOAD_DIR", "uploads")),
            max_file_bytes: parse_env(
                "MODISH_MAX_UPLOAD_BYTES",
                &DEFAULT_MAX_UPLOAD_BYTES.to_string(),
            )?,
        })
    }
}

impl OAuthConfig {
    fn from_env() -> Self {
        Self {
            google: oauth_client("GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"),
            naver: oauth_client("NAVER_CLIENT_ID", "NAVER_CLIENT_SECRET"),
        }
    }
}

impl PaymentConfig {
    fn from_env() -> Self {
        Self {
            secret_key: get_optional_env("TOSS_SECRET_KEY").map(SecretString::from),
            api_url: get_env_or_default("TOSS_API_URL", "https://api.tosspayments.com")
                .trim_end_matches('/')
                .to_owned(),
        }
    }
}

impl AiConfig {
    fn from_env() -> Self {
        Self {
            api_key: get_optional_env("OPENAI_API_KEY").map(SecretString::from),
            api_url: get_env_or_default("OPENAI_API_URL", "https://api.openai.com")
                .trim_end_matches('/')
                .to_owned(),
            model: get_env_or_default("OPENAI_MODEL", "gpt-4o-mini"),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Split a comma-separated origin list, dropping blanks and trailing slashes.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/'))
        .filter(|o| !o.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Build OAuth client credentials when both variables are present.
fn oauth_client(id_key: &str, secret_key: &str) -> Option<OAuthClientConfig> {
    let client_id = get_optional_env(id_key)?;
    let client_secret = get_optional_env(secret_key)?;
    Some(OAuthClientConfig {
        client_id,
        client_secret: SecretString::from(client_secret),
    })
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= \
                 {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_config() -> ApiConfig {
        ApiConfig {
            database_url: SecretString::from("postgres://localhost/modish"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8080,
            base_url: "http://localhost:8080".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            cors_origins: vec!["http://localhost:3000".to_string()],
            jwt: JwtConfig {
                secret: SecretString::from("k3Y!q9Zr#4vT8wLp2@xN6mB0cF5hJ7sD"),
                access_ttl: Duration::from_secs(3600),
                refresh_ttl: Duration::from_secs(604_800),
                cookie_secure: false,
            },
            upload: UploadConfig {
                dir: PathBuf::from("uploads"),
                max_file_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            oauth: OAuthConfig::default(),
            payment: PaymentConfig {
                secret_key: Some(SecretString::from("test_sk_very_private")),
                api_url: "https://api.tosspayments.com".to_string(),
            },
            ai: AiConfig {
                api_key: Some(SecretString::from("sk-live-very-private")),
                api_url: "https://api.openai.com".to_string(),
                model: "gpt-4o-mini".to_string(),
            },
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-jwt-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength(&"ab".repeat(20), "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_secret_length() {
        assert!(validate_secret_length(&SecretString::from("short"), "K").is_err());
        assert!(validate_secret_length(&SecretString::from("a".repeat(32)), "K").is_ok());
    }

    #[test]
    fn test_parse_origins() {
        let origins = parse_origins(" http://localhost:3000/ , ,http://localhost:5173");
        assert_eq!(
            origins,
            vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string()
            ]
        );
    }

    #[test]
    fn test_socket_addr() {
        let addr = sample_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug_output = format!("{:?}", sample_config());

        assert!(debug_output.contains("gpt-4o-mini"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("k3Y!q9Zr"));
        assert!(!debug_output.contains("test_sk_very_private"));
        assert!(!debug_output.contains("sk-live-very-private"));
    }
}
