//! Authentication gate and extractors.
//!
//! [`auth_gate`] runs on every request. It resolves the access token from the
//! `Authorization: Bearer` header or the `accessToken` cookie, places the
//! [`Principal`] in the request extensions and enforces the rule table in
//! [`super::access`]. Handlers then read the caller through the extractors
//! below.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use modish_core::Role;
use tracing::Span;

use super::access::{Access, required_access};
use super::cookies::{ACCESS_TOKEN_COOKIE, bearer_token, get_cookie};
use crate::error::{AppError, set_sentry_user};
use crate::services::auth::Principal;
use crate::state::AppState;

/// Middleware that authenticates the caller and applies the access rules.
///
/// An invalid or missing token makes the request anonymous; only routes that
/// require authentication reject it (401), and role-gated routes reject
/// other roles (403).
pub async fn auth_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let principal = resolve_principal(&state, &request);

    if let Some(principal) = &principal {
        Span::current().record("user_id", principal.user_id.as_i64());
        set_sentry_user(&principal.user_id, Some(principal.email.as_str()));
    }

    let access = required_access(request.method(), request.uri().path());
    if let Err(err) = check_access(access, principal.as_ref()) {
        return err.into_response();
    }

    if let Some(principal) = principal {
        request.extensions_mut().insert(principal);
    }

    next.run(request).await
}

/// Try the bearer header first, then the `accessToken` cookie. A token that
/// fails verification is skipped rather than rejected.
fn resolve_principal(state: &AppState, request: &Request) -> Option<Principal> {
    let headers = request.headers();
    [bearer_token(headers), get_cookie(headers, ACCESS_TOKEN_COOKIE)]
        .into_iter()
        .flatten()
        .find_map(|token| match state.tokens().verify_access(&token) {
            Ok(principal) => Some(principal),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid access token");
                None
            }
        })
}

/// Decide whether a caller satisfies a route's access requirement.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` for anonymous callers on protected routes
/// and `AppError::Forbidden` for callers with the wrong role.
pub fn check_access(access: Access, principal: Option<&Principal>) -> Result<(), AppError> {
    match (access, principal) {
        (Access::Public, _) | (Access::Authenticated, Some(_)) => Ok(()),
        (Access::Authenticated | Access::Role(_), None) => Err(unauthorized()),
        (Access::Role(role), Some(principal)) if principal.role == role => Ok(()),
        (Access::Role(_), Some(_)) => Err(forbidden()),
    }
}

fn unauthorized() -> AppError {
    AppError::Unauthorized("Authentication required".to_string())
}

fn forbidden() -> AppError {
    AppError::Forbidden("Access denied".to_string())
}

/// Extractor that requires an authenticated caller.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(principal): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", principal.email)
/// }
/// ```
pub struct RequireAuth(pub Principal);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(Self)
            .ok_or_else(unauthorized)
    }
}

/// Extractor that optionally gets the caller.
///
/// Unlike `RequireAuth`, this never rejects the request.
pub struct OptionalAuth(pub Option<Principal>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Principal>().cloned()))
    }
}

/// Extractor that requires an administrator.
pub struct RequireAdmin(pub Principal);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = parts.extensions.get::<Principal>().cloned();
        check_access(Access::Role(Role::Admin), principal.as_ref())?;
        principal.map(Self).ok_or_else(unauthorized)
    }
}
