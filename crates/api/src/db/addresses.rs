//! Address repository.
//!
//! Every write runs in one transaction so the at-most-one-default invariant
//! (also enforced by a partial unique index) holds between statements.

use sqlx::{PgConnection, PgPool};

use modish_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::address::{Address, AddressRequest, MAX_ADDRESSES_PER_USER};

const ADDRESS_COLUMNS: &str = "id, user_id, addr_name, receiver_name, receiver_phone, zipcode, \
                               address, addr_detail, is_default, created_at, updated_at";

/// Why an address write was refused.
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("at most 3 addresses can be saved")]
    LimitReached,

    #[error("address not found")]
    NotFound,

    #[error("not your address")]
    NotOwner,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for AddressError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's addresses, default first, then newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let addresses = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM shop.address WHERE user_id = $1 \
             ORDER BY is_default DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(addresses)
    }

    /// Add an address. The first address, or one flagged `isDefault`,
    /// becomes the only default.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::LimitReached` when the user already has the
    /// maximum number of addresses.
    #[tracing::instrument(skip(self, request))]
    pub async fn create(
        &self,
        user_id: UserId,
        request: &AddressRequest,
    ) -> Result<Address, AddressError> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, user_id).await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shop.address WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
        if count >= MAX_ADDRESSES_PER_USER {
            return Err(AddressError::LimitReached);
        }

        let is_default = count == 0 || request.wants_default();
        if is_default {
            clear_default(&mut tx, user_id).await?;
        }

        let address = sqlx::query_as::<_, Address>(&format!(
            r"
            INSERT INTO shop.address
                (user_id, addr_name, receiver_name, receiver_phone, zipcode, address,
                 addr_detail, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(request.addr_name.trim())
        .bind(request.receiver_name.trim())
        .bind(request.receiver_phone.trim())
        .bind(request.zipcode.trim())
        .bind(request.address.trim())
        .bind(request.addr_detail.as_deref())
        .bind(is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(address)
    }

    /// Update one of the user's addresses. `isDefault=true` makes it the only
    /// default; otherwise the default flag is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::NotFound` or `AddressError::NotOwner`.
    pub async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        request: &AddressRequest,
    ) -> Result<Address, AddressError> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, user_id).await?;
        lock_owned(&mut tx, user_id, id).await?;

        if request.wants_default() {
            clear_default(&mut tx, user_id).await?;
        }

        let address = sqlx::query_as::<_, Address>(&format!(
            r"
            UPDATE shop.address
            SET addr_name = $2, receiver_name = $3, receiver_phone = $4, zipcode = $5,
                address = $6, addr_detail = $7, is_default = is_default OR $8,
                updated_at = now()
            WHERE id = $1
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(id)
        .bind(request.addr_name.trim())
        .bind(request.receiver_name.trim())
        .bind(request.receiver_phone.trim())
        .bind(request.zipcode.trim())
        .bind(request.address.trim())
        .bind(request.addr_detail.as_deref())
        .bind(request.wants_default())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(address)
    }

    /// Delete one of the user's addresses. If it was the default, the
    /// remaining address with the highest id becomes the default.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::NotFound` or `AddressError::NotOwner`.
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<(), AddressError> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, user_id).await?;
        let was_default = lock_owned(&mut tx, user_id, id).await?;

        sqlx::query("DELETE FROM shop.address WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if was_default {
            sqlx::query(
                r"
                UPDATE shop.address SET is_default = TRUE, updated_at = now()
                WHERE id = (
                    SELECT id FROM shop.address WHERE user_id = $1 ORDER BY id DESC LIMIT 1
                )
                ",
            )
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Make one of the user's addresses the only default.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::NotFound` or `AddressError::NotOwner`.
    pub async fn set_default(&self, user_id: UserId, id: AddressId) -> Result<(), AddressError> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, user_id).await?;
        lock_owned(&mut tx, user_id, id).await?;
        clear_default(&mut tx, user_id).await?;

        sqlx::query("UPDATE shop.address SET is_default = TRUE, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Lock the user row. Every address write takes it before touching the
/// default flag, so writes for one user run one at a time.
async fn lock_user(conn: &mut PgConnection, user_id: UserId) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT id FROM shop.user WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Lock an address and check its owner. Returns whether it is the default.
async fn lock_owned(
    conn: &mut PgConnection,
    user_id: UserId,
    id: AddressId,
) -> Result<bool, AddressError> {
    let row: Option<(UserId, bool)> =
        sqlx::query_as("SELECT user_id, is_default FROM shop.address WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    match row {
        None => Err(AddressError::NotFound),
        Some((owner, _)) if owner != user_id => Err(AddressError::NotOwner),
        Some((_, is_default)) => Ok(is_default),
    }
}

async fn clear_default(conn: &mut PgConnection, user_id: UserId) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE shop.address SET is_default = FALSE, updated_at = now() \
         WHERE user_id = $1 AND is_default",
    )
    .bind(user_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
