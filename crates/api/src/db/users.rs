//! User repository for database operations.

use sqlx::PgPool;

use modish_core::{Email, Role, UserId};

use super::RepositoryError;
use crate::models::user::{NewUser, ProfileUpdate, User};

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r"
            SELECT id, email, username, zip_code, addr, addr_detail, phone,
                   role, provider, provider_id, created_at, updated_at
            FROM shop.user
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r"
            SELECT id, email, username, zip_code, addr, addr_detail, phone,
                   role, provider, provider_id, created_at, updated_at
            FROM shop.user
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Check whether an account already uses this email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn email_exists(&self, email: &Email) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM shop.user WHERE email = $1)")
                .bind(email)
                .fetch_one(self.pool)
                .await?;

        Ok(exists)
    }

    /// Get a user with their password hash for login.
    ///
    /// The hash is `None` for OAuth-only accounts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, Option<String>)>, RepositoryError> {
        let Some(user) = self.get_by_email(email).await? else {
            return Ok(None);
        };
        let hash = self.password_hash_for(user.id).await?;
        Ok(Some((user, hash)))
    }

    /// Get the stored password hash of a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn password_hash_for(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let hash: Option<Option<String>> =
            sqlx::query_scalar("SELECT password_hash FROM shop.user WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(hash.flatten())
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email (or provider identity) already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            r"
            INSERT INTO shop.user
                (email, password_hash, username, zip_code, addr, addr_detail, phone,
                 role, provider, provider_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, email, username, zip_code, addr, addr_detail, phone,
                      role, provider, provider_id, created_at, updated_at
            ",
        )
        .bind(&new_user.email)
        .bind(new_user.password_hash.as_deref())
        .bind(&new_user.username)
        .bind(new_user.zip_code.as_deref())
        .bind(new_user.addr.as_deref())
        .bind(new_user.addr_detail.as_deref())
        .bind(new_user.phone.as_deref())
        .bind(new_user.role)
        .bind(new_user.provider.as_deref())
        .bind(new_user.provider_id.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_on_unique(e, "email already exists"))
    }

    /// Update the provided profile fields, keeping the others.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            r"
            UPDATE shop.user
            SET username = COALESCE($2, username),
                zip_code = COALESCE($3, zip_code),
                addr = COALESCE($4, addr),
                addr_detail = COALESCE($5, addr_detail),
                phone = COALESCE($6, phone),
                updated_at = now()
            WHERE id = $1
            RETURNING id, email, username, zip_code, addr, addr_detail, phone,
                      role, provider, provider_id, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(update.username.as_deref())
        .bind(update.zip_code.as_deref())
        .bind(update.addr.as_deref())
        .bind(update.addr_detail.as_deref())
        .bind(update.phone.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.user SET password_hash = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Change a user's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_role(&self, id: UserId, role: Role) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE shop.user SET role = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(role)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // =========================================================================
    // OAuth identities
    // =========================================================================

    /// Find the account linked to an OAuth identity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_provider(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r"
            SELECT id, email, username, zip_code, addr, addr_detail, phone,
                   role, provider, provider_id, created_at, updated_at
            FROM shop.user
            WHERE provider = $1 AND provider_id = $2
            ",
        )
        .bind(provider)
        .bind(provider_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Link an OAuth identity to an existing account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Conflict` if the identity is linked to another account.
    pub async fn link_provider(
        &self,
        id: UserId,
        provider: &str,
        provider_id: &str,
    ) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            r"
            UPDATE shop.user
            SET provider = $2, provider_id = $3, updated_at = now()
            WHERE id = $1
            RETURNING id, email, username, zip_code, addr, addr_detail, phone,
                      role, provider, provider_id, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(provider)
        .bind(provider_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_on_unique(e, "identity already linked"))?
        .ok_or(RepositoryError::NotFound)
    }
}
