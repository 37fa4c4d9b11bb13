//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Every error renders the `{success: false, data: null, message}` envelope.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::db::addresses::AddressError;
use crate::db::orders::OrderError;
use crate::response::ApiResponse;
use crate::services::auth::{AuthError, TokenError};
use crate::services::payment::PaymentError;
use crate::services::uploads::UploadError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Address write refused.
    #[error("Address error: {0}")]
    Address(#[from] AddressError),

    /// Storing or reading an uploaded file failed.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Payment gateway call failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but not allowed (wrong role or not the owner).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Database(err)
            | Self::Order(OrderError::Repository(err))
            | Self::Address(AddressError::Repository(err)) => repository_status(err),
            Self::Order(OrderError::EmptyCart | OrderError::Total(_))
            | Self::Address(AddressError::LimitReached) => StatusCode::BAD_REQUEST,
            Self::Address(AddressError::NotFound) => StatusCode::NOT_FOUND,
            Self::Address(AddressError::NotOwner) => StatusCode::FORBIDDEN,
            Self::Auth(err) => match err {
                AuthError::Token(TokenError::Encode(_)) => StatusCode::INTERNAL_SERVER_ERROR,
                AuthError::InvalidCredentials
                | AuthError::UserNotFound
                | AuthError::Token(_) => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::PasswordMismatch
                | AuthError::InvalidEmail(_)
                | AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Upload(err) => match err {
                UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
                UploadError::NotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::Payment(err) => match err {
                PaymentError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
                PaymentError::Rejected { .. } => StatusCode::BAD_REQUEST,
                PaymentError::Http(_) | PaymentError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client. Internal details never leave the server.
    fn client_message(&self) -> String {
        match self {
            Self::Database(err)
            | Self::Order(OrderError::Repository(err))
            | Self::Address(AddressError::Repository(err)) => repository_message(err),
            Self::Order(err) => err.to_string(),
            Self::Address(err) => err.to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    "Invalid credentials".to_string()
                }
                AuthError::Token(TokenError::Encode(_)) => "Internal server error".to_string(),
                AuthError::Token(_) => "Invalid or expired token".to_string(),
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) | AuthError::InvalidInput(msg) => msg.clone(),
                AuthError::PasswordMismatch => "Passwords do not match".to_string(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Internal server error".to_string()
                }
            },
            Self::Upload(UploadError::Io(_)) => "Internal server error".to_string(),
            Self::Upload(err) => err.to_string(),
            Self::Payment(err) => match err {
                PaymentError::NotConfigured => "Payment service is not configured".to_string(),
                PaymentError::Rejected { message, .. } => message.clone(),
                PaymentError::Http(_) | PaymentError::InvalidResponse(_) => {
                    "Payment gateway unavailable".to_string()
                }
            },
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg) => msg.clone(),
        }
    }
}

fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn repository_message(err: &RepositoryError) -> String {
    match err {
        RepositoryError::NotFound => "Not found".to_string(),
        RepositoryError::Conflict(msg) => msg.clone(),
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            "Internal server error".to_string()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, ApiResponse::failure(self.client_message())).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Called by the auth gate so errors are associated with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
