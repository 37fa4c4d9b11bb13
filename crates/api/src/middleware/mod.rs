//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, capture errors)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (record on span, echo in response)
//! 4. CORS (credentials allowed for the configured origins)
//! 5. Security headers
//! 6. Auth gate (resolve the caller, apply the access rules)

pub mod access;
pub mod auth;
pub mod cookies;
pub mod request_id;
pub mod security_headers;

pub use access::{Access, required_access};
pub use auth::{OptionalAuth, RequireAdmin, RequireAuth, auth_gate};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
