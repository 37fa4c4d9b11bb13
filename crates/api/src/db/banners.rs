//! Banner repository.

use sqlx::PgPool;

use modish_core::BannerId;

use super::RepositoryError;
use crate::models::banner::{Banner, BannerInput};

const BANNER_COLUMNS: &str =
    "id, image_url, title, link_url, display_order, is_active, created_at, updated_at";

/// Repository for banner database operations.
pub struct BannerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BannerRepository<'a> {
    /// Create a new banner repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Banners by `display_order`, then id. `active_only` hides inactive ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, active_only: bool) -> Result<Vec<Banner>, RepositoryError> {
        let banners = sqlx::query_as::<_, Banner>(&format!(
            "SELECT {BANNER_COLUMNS} FROM shop.banner \
             WHERE is_active OR NOT $1 \
             ORDER BY display_order, id"
        ))
        .bind(active_only)
        .fetch_all(self.pool)
        .await?;
        Ok(banners)
    }

    /// Get a banner by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: BannerId) -> Result<Option<Banner>, RepositoryError> {
        let banner = sqlx::query_as::<_, Banner>(&format!(
            "SELECT {BANNER_COLUMNS} FROM shop.banner WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(banner)
    }

    /// Insert a banner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        input: &BannerInput,
        image_url: &str,
    ) -> Result<Banner, RepositoryError> {
        let banner = sqlx::query_as::<_, Banner>(&format!(
            r"
            INSERT INTO shop.banner (image_url, title, link_url, display_order, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {BANNER_COLUMNS}
            "
        ))
        .bind(image_url)
        .bind(&input.title)
        .bind(&input.link_url)
        .bind(input.display_order)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await?;
        Ok(banner)
    }

    /// Update a banner; a provided image URL replaces the stored one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the banner doesn't exist.
    pub async fn update(
        &self,
        id: BannerId,
        input: &BannerInput,
        image_url: Option<&str>,
    ) -> Result<Banner, RepositoryError> {
        let banner = sqlx::query_as::<_, Banner>(&format!(
            r"
            UPDATE shop.banner
            SET title = $2, link_url = $3, display_order = $4, is_active = $5,
                image_url = COALESCE($6, image_url), updated_at = now()
            WHERE id = $1
            RETURNING {BANNER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.title)
        .bind(&input.link_url)
        .bind(input.display_order)
        .bind(input.is_active)
        .bind(image_url)
        .fetch_optional(self.pool)
        .await?;

        banner.ok_or(RepositoryError::NotFound)
    }

    /// Delete a banner, returning the removed row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the banner doesn't exist.
    pub async fn delete(&self, id: BannerId) -> Result<Banner, RepositoryError> {
        let banner = sqlx::query_as::<_, Banner>(&format!(
            "DELETE FROM shop.banner WHERE id = $1 RETURNING {BANNER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        banner.ok_or(RepositoryError::NotFound)
    }
}
