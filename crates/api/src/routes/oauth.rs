//! Social login route handlers (Google, Naver).
//!
//! - Authorize: sets the `oauthState` cookie and redirects to the provider
//! - Callback: checks the state, resolves the identity to a local account,
//!   sets the token cookies and redirects back to the frontend

use std::time::Duration;

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::error::AppError;
use crate::extract::{ApiPath, ApiQuery};
use crate::middleware::cookies::{
    OAUTH_STATE_COOKIE, OAUTH_STATE_PATH, build_cookie, clear_cookie, get_cookie,
};
use crate::routes::auth::{append_cookie, issue_session};
use crate::services::auth::AuthService;
use crate::services::oauth::{OAuthProvider, generate_state};
use crate::state::AppState;

const STATE_COOKIE_TTL: Duration = Duration::from_secs(600);

/// Query parameters of the provider callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Resolve a path segment to a provider that has credentials.
fn enabled_provider(state: &AppState, name: &str) -> Result<OAuthProvider, AppError> {
    let provider: OAuthProvider = name
        .parse()
        .map_err(|_| AppError::NotFound(format!("Unknown login provider: {name}")))?;
    if !state.oauth().is_enabled(provider) {
        return Err(AppError::NotFound(format!(
            "Login provider {name} is not configured"
        )));
    }
    Ok(provider)
}

/// Start the authorization code flow.
///
/// # Route
///
/// `GET /oauth2/authorization/{provider}`
pub async fn authorize(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
) -> Result<Response, AppError> {
    let provider = enabled_provider(&state, &name)?;
    let oauth_state = generate_state();

    let url = state
        .oauth()
        .authorization_url(provider, &oauth_state)
        .map_err(|e| AppError::NotFound(e.to_string()))?;

    let mut cookies = HeaderMap::new();
    append_cookie(
        &mut cookies,
        build_cookie(
            OAUTH_STATE_COOKIE,
            &oauth_state,
            OAUTH_STATE_PATH,
            STATE_COOKIE_TTL,
            state.config().jwt.cookie_secure,
        ),
    );

    Ok((cookies, Redirect::to(&url)).into_response())
}

/// Handle the provider callback.
///
/// Every failure after the provider check redirects to the frontend with
/// `result=failure`.
///
/// # Route
///
/// `GET /login/oauth2/code/{provider}`
pub async fn callback(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<CallbackQuery>,
) -> Result<Response, AppError> {
    let provider = enabled_provider(&state, &name)?;

    let frontend = state.config().frontend_url.trim_end_matches('/');
    let failure = || Redirect::to(&format!("{frontend}/login?result=failure")).into_response();

    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        tracing::warn!(
            provider = provider.as_str(),
            %error,
            %description,
            "OAuth authorization denied"
        );
        return Ok(failure());
    }

    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        tracing::warn!(provider = provider.as_str(), "OAuth callback missing code");
        return Ok(failure());
    };

    let Some(returned_state) = query.state else {
        tracing::warn!(provider = provider.as_str(), "OAuth callback missing state");
        return Ok(failure());
    };

    if get_cookie(&headers, OAUTH_STATE_COOKIE).as_deref() != Some(returned_state.as_str()) {
        tracing::warn!(provider = provider.as_str(), "OAuth state mismatch");
        return Ok(failure());
    }

    let identity = match state
        .oauth()
        .fetch_identity(provider, &code, &returned_state)
        .await
    {
        Ok(identity) => identity,
        Err(e) => {
            tracing::error!(
                provider = provider.as_str(),
                error = %e,
                "OAuth identity fetch failed"
            );
            return Ok(failure());
        }
    };

    let user = match AuthService::new(state.pool())
        .find_or_create_oauth_user(&identity)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::error!(
                provider = provider.as_str(),
                error = %e,
                "OAuth account resolution failed"
            );
            return Ok(failure());
        }
    };

    let session = match issue_session(&state, &user) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, "Failed to issue tokens after OAuth login");
            return Ok(failure());
        }
    };

    let mut cookies = session.cookies;
    append_cookie(
        &mut cookies,
        clear_cookie(
            OAUTH_STATE_COOKIE,
            OAUTH_STATE_PATH,
            state.config().jwt.cookie_secure,
        ),
    );

    tracing::info!(user_id = %user.id, provider = provider.as_str(), "OAuth login succeeded");

    Ok((
        cookies,
        Redirect::to(&format!("{frontend}/login?result=success")),
    )
        .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
    };
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::OAuthClientConfig;
    use crate::test_support::{test_config, test_state};

    fn google_state() -> AppState {
        let mut config = test_config();
        config.oauth.google = Some(OAuthClientConfig {
            client_id: "google-client".to_string(),
            client_secret: SecretString::from("google-secret"),
        });
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/modish_test")
            .unwrap();
        AppState::new(config, pool)
    }

    fn app(state: AppState) -> Router {
        crate::routes::oauth_routes().with_state(state)
    }

    #[tokio::test]
    async fn test_unknown_provider_is_not_found() {
        let response = app(test_state())
            .oneshot(
                Request::get("/oauth2/authorization/kakao")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unconfigured_provider_is_not_found() {
        let response = app(test_state())
            .oneshot(
                Request::get("/oauth2/authorization/naver")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_authorize_sets_state_cookie_and_redirects() {
        let response = app(google_state())
            .oneshot(
                Request::get("/oauth2/authorization/google")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("https://accounts.google.com/"));

        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("oauthState="));
        assert!(cookie.contains("Path=/login/oauth2"));

        let oauth_state = cookie
            .trim_start_matches("oauthState=")
            .split(';')
            .next()
            .unwrap();
        assert!(location.contains(&format!("state={oauth_state}")));
    }

    #[tokio::test]
    async fn test_callback_state_mismatch_redirects_to_failure() {
        let response = app(google_state())
            .oneshot(
                Request::get("/login/oauth2/code/google?code=abc&state=forged")
                    .header(header::COOKIE, "oauthState=expected")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "http://localhost:3000/login?result=failure"
        );
    }

    #[tokio::test]
    async fn test_callback_provider_error_redirects_to_failure() {
        let response = app(google_state())
            .oneshot(
                Request::get("/login/oauth2/code/google?error=access_denied")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers()[header::LOCATION],
            "http://localhost:3000/login?result=failure"
        );
    }
}
