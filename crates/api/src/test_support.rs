//! Shared fixtures for handler and middleware tests.
//!
//! The pool connects lazily, so routers can be exercised with `oneshot`
//! as long as the request never reaches a query.

#![allow(clippy::unwrap_used)]

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;

use crate::config::{
    AiConfig, ApiConfig, DEFAULT_MAX_UPLOAD_BYTES, JwtConfig, OAuthConfig, PaymentConfig,
    UploadConfig,
};
use crate::state::AppState;

/// Configuration with no outbound integrations enabled.
pub fn test_config() -> ApiConfig {
    ApiConfig {
        database_url: SecretString::from("postgres://localhost/modish_test"),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
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
            dir: std::env::temp_dir().join("modish-test-uploads"),
            max_file_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        },
        oauth: OAuthConfig::default(),
        payment: PaymentConfig {
            secret_key: None,
            api_url: "http://127.0.0.1:9".to_string(),
        },
        ai: AiConfig {
            api_key: None,
            api_url: "http://127.0.0.1:9".to_string(),
            model: "gpt-4o-mini".to_string(),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Application state over a pool that never connects unless queried.
pub fn test_state() -> AppState {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy("postgres://localhost/modish_test")
        .unwrap();
    AppState::new(test_config(), pool)
}

/// Scratch directory unique to one test.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("modish-{name}-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
