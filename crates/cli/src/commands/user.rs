//! User management commands.

use modish_api::db::RepositoryError;
use modish_api::db::users::UserRepository;
use modish_api::models::user::NewUser;
use modish_api::services::auth::{AuthError, hash_password, validate_password};
use modish_core::{Email, Role, UserId};

use super::{CommandError, connect};

/// User command errors.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Repository error.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Invalid role.
    #[error("Invalid role: {0}. Must be one of: user, admin")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password rejected or could not be hashed.
    #[error(transparent)]
    Password(#[from] AuthError),

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),
}

/// Validated input for a new password account.
pub(crate) fn new_user(
    email: &str,
    name: &str,
    password: &str,
    role: &str,
) -> Result<NewUser, UserError> {
    let role: Role = role
        .parse()
        .map_err(|_| UserError::InvalidRole(role.to_owned()))?;
    let email = Email::parse(email).map_err(|_| UserError::InvalidEmail(email.to_owned()))?;
    validate_password(password)?;

    Ok(NewUser {
        email,
        password_hash: Some(hash_password(password)?),
        username: name.trim().to_owned(),
        zip_code: None,
        addr: None,
        addr_detail: None,
        phone: None,
        role,
        provider: None,
        provider_id: None,
    })
}

/// Create a new user.
///
/// # Arguments
///
/// * `email` - Login email address
/// * `name` - Display name
/// * `password` - Plain-text password, stored as an Argon2 hash
/// * `role` - `user` or `admin`
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns `UserError::UserExists` if the email is taken.
pub async fn create_user(
    email: &str,
    name: &str,
    password: &str,
    role: &str,
) -> Result<UserId, UserError> {
    let new_user = new_user(email, name, password, role)?;
    let pool = connect().await?;

    tracing::info!("Creating user: {} ({})", new_user.email, new_user.role);

    let user = UserRepository::new(&pool)
        .create(&new_user)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => UserError::UserExists(new_user.email.to_string()),
            other => UserError::Repository(other),
        })?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );

    Ok(user.id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_hashes_password() {
        let user = new_user("Admin@Example.com", " Admin ", "longenough1", "ADMIN").unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.username, "Admin");
        let hash = user.password_hash.unwrap();
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn test_new_user_rejects_bad_input() {
        assert!(matches!(
            new_user("a@b.co", "A", "longenough1", "owner"),
            Err(UserError::InvalidRole(_))
        ));
        assert!(matches!(
            new_user("not-an-email", "A", "longenough1", "user"),
            Err(UserError::InvalidEmail(_))
        ));
        assert!(matches!(
            new_user("a@b.co", "A", "short", "user"),
            Err(UserError::Password(AuthError::WeakPassword(_)))
        ));
    }
}
