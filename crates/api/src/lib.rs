//! Modish shop REST backend library.
//!
//! This crate provides the API server as a library so the router can be
//! exercised in tests and reused by the binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
mod test_support;

use std::time::Duration;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::from_fn,
    middleware::from_fn_with_state,
    routing::get,
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::services::uploads::ImageDir;
use crate::state::AppState;

/// Request body limit headroom on top of the per-file limit, for the other
/// multipart parts.
const BODY_LIMIT_FILES: u64 = 10;
const BODY_LIMIT_SLACK: u64 = 1024 * 1024;

/// Build the CORS layer for the configured origins. Credentials are allowed so
/// browsers send the token cookies.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(%origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(60 * 60))
}

/// Build the application router with every middleware layer.
///
/// Layers listed later wrap the earlier ones, so the request passes through
/// trace, request ID, CORS, security headers and then the auth gate.
pub fn build_app(state: AppState) -> Router {
    let config = state.config();
    let uploads = state.uploads();
    let body_limit = config
        .upload
        .max_file_bytes
        .saturating_mul(BODY_LIMIT_FILES)
        .saturating_add(BODY_LIMIT_SLACK);

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/product", ServeDir::new(uploads.image_dir(ImageDir::Product)))
        .nest_service("/banner", ServeDir::new(uploads.image_dir(ImageDir::Banner)))
        .layer(DefaultBodyLimit::max(
            usize::try_from(body_limit).unwrap_or(usize::MAX),
        ))
        .layer(from_fn_with_state(state.clone(), middleware::auth_gate))
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(cors_layer(&config.cors_origins))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state.clone())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
