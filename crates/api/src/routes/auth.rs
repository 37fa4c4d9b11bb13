//! Account route handlers.
//!
//! Password signup/login, token refresh via the `refreshToken` cookie,
//! logout and profile management. Tokens are returned in the body and set
//! as `HttpOnly` cookies so browser clients never handle them directly.

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, header::SET_COOKIE},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::db::users::UserRepository;
use crate::error::{AppError, Result, clear_sentry_user};
use crate::extract::{ApiJson, ApiQuery};
use crate::middleware::RequireAuth;
use crate::middleware::cookies::{
    ACCESS_TOKEN_COOKIE, ACCESS_TOKEN_PATH, REFRESH_TOKEN_COOKIE, REFRESH_TOKEN_PATH,
    build_cookie, clear_cookie, get_cookie,
};
use crate::models::user::{ProfileUpdate, SignupRequest, User, UserResponse};
use crate::response::ApiResponse;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

const TOKEN_TYPE: &str = "Bearer";

// =============================================================================
// Request / Response Types
// =============================================================================

/// Body of `POST /api/auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Tokens issued at login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub user: UserResponse,
}

/// Token issued by `POST /api/auth/refresh`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

/// Query of `GET /api/auth/check-email`.
#[derive(Debug, Deserialize)]
pub struct CheckEmailQuery {
    #[serde(default)]
    pub email: String,
}

/// Body of `PUT /api/auth/password`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// A freshly issued token pair and the cookies carrying it.
pub struct IssuedSession {
    pub access_token: String,
    pub refresh_token: String,
    pub cookies: HeaderMap,
}

// =============================================================================
// Cookie Helpers
// =============================================================================

/// Issue both tokens for `user` and build their `Set-Cookie` headers.
///
/// # Errors
///
/// Returns `AppError::Auth` if signing fails.
pub fn issue_session(state: &AppState, user: &User) -> Result<IssuedSession> {
    let tokens = state.tokens();
    let access_token = tokens
        .issue_access(user.id, &user.email, user.role)
        .map_err(AuthError::from)?;
    let refresh_token = tokens.issue_refresh(user.id).map_err(AuthError::from)?;

    let secure = state.config().jwt.cookie_secure;
    let mut cookies = HeaderMap::new();
    append_cookie(
        &mut cookies,
        build_cookie(
            ACCESS_TOKEN_COOKIE,
            &access_token,
            ACCESS_TOKEN_PATH,
            tokens.access_ttl(),
            secure,
        ),
    );
    append_cookie(
        &mut cookies,
        build_cookie(
            REFRESH_TOKEN_COOKIE,
            &refresh_token,
            REFRESH_TOKEN_PATH,
            tokens.refresh_ttl(),
            secure,
        ),
    );

    Ok(IssuedSession {
        access_token,
        refresh_token,
        cookies,
    })
}

/// Append a `Set-Cookie` header when the cookie could be built.
pub fn append_cookie(headers: &mut HeaderMap, cookie: Option<HeaderValue>) {
    if let Some(cookie) = cookie {
        headers.append(SET_COOKIE, cookie);
    }
}

// =============================================================================
// Signup / Login
// =============================================================================

/// Create a password account.
#[tracing::instrument(skip(state, request), fields(email = %request.email))]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignupRequest>,
) -> Result<ApiResponse<UserResponse>> {
    let user = AuthService::new(state.pool()).register(&request).await?;
    Ok(ApiResponse::ok_with_message(
        UserResponse::from(&user),
        "Signup complete",
    ))
}

/// Verify credentials and set the token cookies.
#[tracing::instrument(skip(state, request), fields(email = %request.email))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool())
        .login(&request.email, &request.password)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Login failed"))?;

    let session = issue_session(&state, &user)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok((
        session.cookies,
        ApiResponse::ok(LoginResponse {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            token_type: TOKEN_TYPE,
            user: UserResponse::from(&user),
        }),
    ))
}

/// Exchange the `refreshToken` cookie for a new access token.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let token = get_cookie(&headers, REFRESH_TOKEN_COOKIE)
        .ok_or_else(|| AppError::Unauthorized("Refresh token required".to_string()))?;

    let tokens = state.tokens();
    let user_id = tokens.verify_refresh(&token).map_err(AuthError::from)?;
    let user = AuthService::new(state.pool()).get_user(user_id).await?;

    let access_token = tokens
        .issue_access(user.id, &user.email, user.role)
        .map_err(AuthError::from)?;

    let mut cookies = HeaderMap::new();
    append_cookie(
        &mut cookies,
        build_cookie(
            ACCESS_TOKEN_COOKIE,
            &access_token,
            ACCESS_TOKEN_PATH,
            tokens.access_ttl(),
            state.config().jwt.cookie_secure,
        ),
    );

    Ok((
        cookies,
        ApiResponse::ok(RefreshResponse {
            access_token,
            token_type: TOKEN_TYPE,
        }),
    ))
}

/// Clear both token cookies.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let secure = state.config().jwt.cookie_secure;
    let mut cookies = HeaderMap::new();
    append_cookie(
        &mut cookies,
        clear_cookie(ACCESS_TOKEN_COOKIE, ACCESS_TOKEN_PATH, secure),
    );
    append_cookie(
        &mut cookies,
        clear_cookie(REFRESH_TOKEN_COOKIE, REFRESH_TOKEN_PATH, secure),
    );
    clear_sentry_user();

    (cookies, ApiResponse::message("Logged out"))
}

/// `data = true` when the email can still be used for signup.
pub async fn check_email(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CheckEmailQuery>,
) -> Result<ApiResponse<bool>> {
    let available = AuthService::new(state.pool())
        .is_email_available(&query.email)
        .await?;
    Ok(ApiResponse::ok(available))
}

// =============================================================================
// Profile
// =============================================================================

/// The caller's account.
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
) -> Result<ApiResponse<UserResponse>> {
    let user = AuthService::new(state.pool())
        .get_user(principal.user_id)
        .await?;
    Ok(ApiResponse::ok(UserResponse::from(&user)))
}

/// Update the provided profile fields.
pub async fn update_me(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiJson(mut update): ApiJson<ProfileUpdate>,
) -> Result<ApiResponse<UserResponse>> {
    if let Some(username) = update.username.take() {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::BadRequest("username must not be blank".to_string()));
        }
        update.username = Some(username.to_owned());
    }

    let user = UserRepository::new(state.pool())
        .update_profile(principal.user_id, &update)
        .await?;
    Ok(ApiResponse::ok(UserResponse::from(&user)))
}

/// Change the caller's password.
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> Result<ApiResponse<()>> {
    AuthService::new(state.pool())
        .change_password(
            principal.user_id,
            &request.current_password,
            &request.new_password,
        )
        .await?;
    Ok(ApiResponse::message("Password changed"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
    };
    use modish_core::{Email, Role, UserId};
    use tower::ServiceExt;

    use super::*;
    use crate::test_support::test_state;

    fn app(state: AppState) -> Router {
        Router::new()
            .nest("/api/auth", crate::routes::auth_routes())
            .with_state(state)
    }

    fn sample_user() -> User {
        let now = chrono::Utc::now();
        User {
            id: UserId::new(5),
            email: Email::parse("shopper@example.com").unwrap(),
            username: "Shopper".to_string(),
            zip_code: None,
            addr: None,
            addr_detail: None,
            phone: None,
            role: Role::User,
            provider: None,
            provider_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_issue_session_sets_both_cookies() {
        let state = test_state();
        let session = issue_session(&state, &sample_user()).unwrap();

        let cookies: Vec<_> = session
            .cookies
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].starts_with(&format!("accessToken={}", session.access_token)));
        assert!(cookies[0].contains("Path=/;"));
        assert!(cookies[0].contains("Max-Age=3600"));
        assert!(cookies[1].contains("Path=/api/auth/refresh"));
        assert!(cookies[1].contains("Max-Age=604800"));

        let principal = state.tokens().verify_access(&session.access_token).unwrap();
        assert_eq!(principal.user_id, UserId::new(5));
        assert_eq!(
            state.tokens().verify_refresh(&session.refresh_token).unwrap(),
            UserId::new(5)
        );
    }

    #[tokio::test]
    async fn test_logout_clears_cookies() {
        let response = app(test_state())
            .oneshot(Request::post("/api/auth/logout").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookies: Vec<_> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
        assert!(cookies.iter().any(|c| c.starts_with("refreshToken=;")));
    }

    #[tokio::test]
    async fn test_refresh_without_cookie_is_unauthorized() {
        let response = app(test_state())
            .oneshot(Request::post("/api/auth/refresh").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let state = test_state();
        let session = issue_session(&state, &sample_user()).unwrap();

        let response = app(state)
            .oneshot(
                Request::post("/api/auth/refresh")
                    .header(
                        header::COOKIE,
                        format!("refreshToken={}", session.access_token),
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_check_email_rejects_malformed_address() {
        let response = app(test_state())
            .oneshot(
                Request::get("/api/auth/check-email?email=not-an-email")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
