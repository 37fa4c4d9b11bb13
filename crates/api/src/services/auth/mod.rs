//! Authentication service.
//!
//! Provides password accounts (Argon2id), OAuth account linking and the
//! signed tokens that carry a [`Principal`] between requests.

mod error;
pub mod token;

pub use error::{AuthError, TokenError};
pub use token::TokenService;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use modish_core::{Email, Role, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::user::{NewUser, SignupRequest, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum password length.
const MAX_PASSWORD_LENGTH: usize = 20;

/// The authenticated caller, as carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub email: Email,
    pub role: Role,
}

impl Principal {
    /// Authority string derived from the role (`ROLE_USER`, `ROLE_ADMIN`).
    #[must_use]
    pub fn authority(&self) -> String {
        self.role.authority()
    }

    /// Returns `true` for administrators.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Returns `true` if this caller may modify a resource owned by `owner`
    /// (the owner themselves, or an administrator).
    #[must_use]
    pub fn owns_or_admin(&self, owner: UserId) -> bool {
        self.user_id == owner || self.is_admin()
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Identity returned by an OAuth provider's user-info endpoint.
#[derive(Debug, Clone)]
pub struct OAuthIdentity {
    /// `google` or `naver`.
    pub provider: &'static str,
    /// Subject identifier at the provider.
    pub provider_id: String,
    pub email: String,
    pub name: Option<String>,
}

/// Authentication service.
///
/// Handles user registration, login, password changes and OAuth linking.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::PasswordMismatch` if the confirmation differs.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, request: &SignupRequest) -> Result<User, AuthError> {
        let email = Email::parse(&request.email)?;
        validate_password(&request.password)?;
        if request.password != request.password_confirm {
            return Err(AuthError::PasswordMismatch);
        }

        let username = request.username.trim();
        if username.is_empty() {
            return Err(AuthError::InvalidInput("username is required".to_owned()));
        }

        let password_hash = hash_password(&request.password)?;

        let new_user = NewUser {
            email,
            password_hash: Some(password_hash),
            username: username.to_owned(),
            zip_code: non_blank(request.zip_code.as_deref()),
            addr: non_blank(request.addr.as_deref()),
            addr_detail: non_blank(request.addr_detail.as_deref()),
            phone: non_blank(request.phone.as_deref()),
            role: Role::User,
            provider: None,
            provider_id: None,
        };

        let user = self.users.create(&new_user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong
    /// or the account has no password (OAuth-only).
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let password_hash = password_hash.ok_or(AuthError::InvalidCredentials)?;
        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Check whether an email can still be used for signup.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    pub async fn is_email_available(&self, email: &str) -> Result<bool, AuthError> {
        let email = Email::parse(email)?;
        Ok(!self.users.email_exists(&email).await?)
    }

    /// Change a user's password after verifying the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the current password is wrong.
    /// Returns `AuthError::WeakPassword` if the new password doesn't meet requirements.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let current_hash = self
            .users
            .password_hash_for(user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(current_password, &current_hash)?;
        validate_password(new_password)?;

        let new_hash = hash_password(new_password)?;
        self.users.update_password(user_id, &new_hash).await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Resolve an OAuth identity to a local account.
    ///
    /// Looks up the linked account first, then links an existing account
    /// with the same email, and finally creates a password-less user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the provider returned an unusable email.
    pub async fn find_or_create_oauth_user(
        &self,
        identity: &OAuthIdentity,
    ) -> Result<User, AuthError> {
        if let Some(user) = self
            .users
            .get_by_provider(identity.provider, &identity.provider_id)
            .await?
        {
            return Ok(user);
        }

        let email = Email::parse(&identity.email)?;

        if let Some(existing) = self.users.get_by_email(&email).await? {
            let user = self
                .users
                .link_provider(existing.id, identity.provider, &identity.provider_id)
                .await?;
            tracing::info!(
                user_id = %user.id,
                provider = identity.provider,
                "OAuth identity linked"
            );
            return Ok(user);
        }

        let username = identity
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map_or_else(|| local_part(&email), str::to_owned);

        let user = self
            .users
            .create(&NewUser {
                email,
                password_hash: None,
                username,
                zip_code: None,
                addr: None,
                addr_detail: None,
                phone: None,
                role: Role::User,
                provider: Some(identity.provider.to_owned()),
                provider_id: Some(identity.provider_id.clone()),
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, provider = identity.provider, "OAuth user created");
        Ok(user)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Validate password requirements (8 to 20 characters).
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` describing the violated rule.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` on mismatch or an unparseable hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn local_part(email: &Email) -> String {
    email
        .as_str()
        .split('@')
        .next()
        .unwrap_or_default()
        .to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_bounds() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("exactly8").is_ok());
        assert!(validate_password(&"a".repeat(20)).is_ok());
        assert!(matches!(
            validate_password(&"a".repeat(21)),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct-horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct-horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong-horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_password_rejects_garbage_hash() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_principal_ownership() {
        let user = Principal {
            user_id: UserId::new(1),
            email: Email::parse("a@example.com").unwrap(),
            role: Role::User,
        };
        let admin = Principal {
            user_id: UserId::new(2),
            email: Email::parse("b@example.com").unwrap(),
            role: Role::Admin,
        };

        assert!(user.owns_or_admin(UserId::new(1)));
        assert!(!user.owns_or_admin(UserId::new(9)));
        assert!(admin.owns_or_admin(UserId::new(9)));
        assert_eq!(admin.authority(), "ROLE_ADMIN");
    }

    #[test]
    fn test_local_part() {
        let email = Email::parse("jane.doe@example.com").unwrap();
        assert_eq!(local_part(&email), "jane.doe");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(Some(" x ")), Some("x".to_owned()));
        assert_eq!(non_blank(None), None);
    }
}
