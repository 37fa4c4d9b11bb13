//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors from issuing or validating tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token's `exp` is in the past.
    #[error("token expired")]
    Expired,

    /// A refresh token was presented as an access token or vice versa.
    #[error("wrong token type")]
    WrongType,

    /// Bad signature, malformed token or unusable claims.
    #[error("invalid token: {0}")]
    Invalid(String),

    /// Signing failed.
    #[error("token encoding failed: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
}

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] modish_core::EmailError),

    /// Invalid credentials (wrong password, unknown email or OAuth-only account).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Other invalid signup/profile input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Token problem.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
