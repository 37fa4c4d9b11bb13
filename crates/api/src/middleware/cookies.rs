//! Auth cookie helpers.
//!
//! Cookies are parsed from the `Cookie` header and written as raw
//! `Set-Cookie` values; the server keeps no session store.

use std::time::Duration;

use axum::http::{
    HeaderMap, HeaderValue,
    header::{AUTHORIZATION, COOKIE},
};

/// Access token cookie, sent on every path.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
/// Refresh token cookie, only sent to the refresh endpoint.
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";
/// OAuth CSRF state cookie, only sent to the OAuth callback.
pub const OAUTH_STATE_COOKIE: &str = "oauthState";

/// Path the access cookie is scoped to.
pub const ACCESS_TOKEN_PATH: &str = "/";
/// Path the refresh cookie is scoped to.
pub const REFRESH_TOKEN_PATH: &str = "/api/auth/refresh";
/// Path the OAuth state cookie is scoped to.
pub const OAUTH_STATE_PATH: &str = "/login/oauth2";

/// Read a cookie value from the request headers.
#[must_use]
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Read a bearer token from the `Authorization` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_owned())
}

/// Build an `HttpOnly; SameSite=Lax` cookie.
///
/// Returns `None` only if the value contains bytes invalid in a header.
#[must_use]
pub fn build_cookie(
    name: &str,
    value: &str,
    path: &str,
    max_age: Duration,
    secure: bool,
) -> Option<HeaderValue> {
    let mut cookie = format!(
        "{name}={value}; Path={path}; Max-Age={}; HttpOnly; SameSite=Lax",
        max_age.as_secs()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

/// Build a cookie that deletes `name` on `path`.
#[must_use]
pub fn clear_cookie(name: &str, path: &str, secure: bool) -> Option<HeaderValue> {
    build_cookie(name, "", path, Duration::ZERO, secure)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_get_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; accessToken=abc.def.ghi ; other=1"),
        );

        assert_eq!(
            get_cookie(&headers, ACCESS_TOKEN_COOKIE).as_deref(),
            Some("abc.def.ghi")
        );
        assert_eq!(get_cookie(&headers, "other").as_deref(), Some("1"));
        assert!(get_cookie(&headers, REFRESH_TOKEN_COOKIE).is_none());
    }

    #[test]
    fn test_get_cookie_ignores_empty_values() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("accessToken="));
        assert!(get_cookie(&headers, ACCESS_TOKEN_COOKIE).is_none());
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok123"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("tok123"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer tok456"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("tok456"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpw"));
        assert!(bearer_token(&headers).is_none());
    }

    #[test]
    fn test_build_cookie() {
        let cookie = build_cookie(
            ACCESS_TOKEN_COOKIE,
            "tok",
            ACCESS_TOKEN_PATH,
            Duration::from_secs(3600),
            false,
        )
        .unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "accessToken=tok; Path=/; Max-Age=3600; HttpOnly; SameSite=Lax"
        );

        let secure = build_cookie("a", "b", "/", Duration::from_secs(1), true).unwrap();
        assert!(secure.to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn test_clear_cookie() {
        let cookie = clear_cookie(REFRESH_TOKEN_COOKIE, REFRESH_TOKEN_PATH, false).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "refreshToken=; Path=/api/auth/refresh; Max-Age=0; HttpOnly; SameSite=Lax"
        );
    }
}
