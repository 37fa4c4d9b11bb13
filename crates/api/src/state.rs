//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::services::ai::AiClient;
use crate::services::auth::TokenService;
use crate::services::oauth::OAuthClient;
use crate::services::payment::PaymentClient;
use crate::services::uploads::UploadStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    tokens: TokenService,
    uploads: UploadStore,
    oauth: OAuthClient,
    payment: PaymentClient,
    ai: AiClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: ApiConfig, pool: PgPool) -> Self {
        let tokens = TokenService::new(&config.jwt);
        let uploads = UploadStore::new(&config.upload);
        let oauth = OAuthClient::new(&config.oauth, &config.base_url);
        let payment = PaymentClient::new(&config.payment);
        let ai = AiClient::new(&config.ai);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                uploads,
                oauth,
                payment,
                ai,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get a reference to the upload store.
    #[must_use]
    pub fn uploads(&self) -> &UploadStore {
        &self.inner.uploads
    }

    /// Get a reference to the OAuth client.
    #[must_use]
    pub fn oauth(&self) -> &OAuthClient {
        &self.inner.oauth
    }

    /// Get a reference to the payment gateway client.
    #[must_use]
    pub fn payment(&self) -> &PaymentClient {
        &self.inner.payment
    }

    /// Get a reference to the AI relay client.
    #[must_use]
    pub fn ai(&self) -> &AiClient {
        &self.inner.ai
    }
}
