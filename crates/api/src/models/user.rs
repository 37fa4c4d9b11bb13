//! User domain types.
//!
//! `User` is the database row; `UserResponse` is what the API returns. The
//! password hash never leaves the repository layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use modish_core::{Email, Role, UserId};

/// A shop account (local password and/or OAuth-linked).
#[derive(Debug, Clone, FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login email, unique across accounts.
    pub email: Email,
    /// Display name.
    pub username: String,
    pub zip_code: Option<String>,
    pub addr: Option<String>,
    pub addr_detail: Option<String>,
    pub phone: Option<String>,
    /// Authorization role.
    pub role: Role,
    /// OAuth provider (`google`, `naver`) for accounts created or linked through social login.
    pub provider: Option<String>,
    /// Subject identifier at the OAuth provider.
    pub provider_id: Option<String>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data for inserting a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    /// Argon2 PHC string; `None` for OAuth-only accounts.
    pub password_hash: Option<String>,
    pub username: String,
    pub zip_code: Option<String>,
    pub addr: Option<String>,
    pub addr_detail: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub provider: Option<String>,
    pub provider_id: Option<String>,
}

/// Body of `POST /api/auth/signup`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub username: String,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub addr: Option<String>,
    #[serde(default)]
    pub addr_detail: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Partial profile update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub zip_code: Option<String>,
    pub addr: Option<String>,
    pub addr_detail: Option<String>,
    pub phone: Option<String>,
}

/// User as returned by `/api/auth/*`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: UserId,
    pub email: String,
    pub username: String,
    pub zip_code: Option<String>,
    pub addr: Option<String>,
    pub addr_detail: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub provider: Option<String>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.as_str().to_owned(),
            username: user.username.clone(),
            zip_code: user.zip_code.clone(),
            addr: user.addr.clone(),
            addr_detail: user.addr_detail.clone(),
            phone: user.phone.clone(),
            role: user.role,
            provider: user.provider.clone(),
        }
    }
}
