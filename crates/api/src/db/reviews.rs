//! Review repository.

use sqlx::PgPool;

use modish_core::{ItemId, ReviewId, UserId};

use super::RepositoryError;
use crate::models::review::Review;

const REVIEW_SELECT: &str = r"
    SELECT r.id AS review_id, r.item_id, r.user_id, u.username, r.content, r.score,
           r.created_at, r.updated_at
    FROM shop.review r
    JOIN shop.user u ON u.id = r.user_id
";

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews of an item, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_item(&self, item_id: ItemId) -> Result<Vec<Review>, RepositoryError> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "{REVIEW_SELECT} WHERE r.item_id = $1 ORDER BY r.id DESC"
        ))
        .bind(item_id)
        .fetch_all(self.pool)
        .await?;
        Ok(reviews)
    }

    /// Get a review by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        let review = sqlx::query_as::<_, Review>(&format!("{REVIEW_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(review)
    }

    /// Add a review to an item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        item_id: ItemId,
        user_id: UserId,
        content: &str,
        score: i32,
    ) -> Result<Review, RepositoryError> {
        let id: Option<ReviewId> = sqlx::query_scalar(
            r"
            INSERT INTO shop.review (item_id, user_id, content, score)
            SELECT id, $2, $3, $4 FROM shop.item WHERE id = $1
            RETURNING id
            ",
        )
        .bind(item_id)
        .bind(user_id)
        .bind(content)
        .bind(score)
        .fetch_optional(self.pool)
        .await?;

        let id = id.ok_or(RepositoryError::NotFound)?;
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Replace a review's content and score.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist.
    pub async fn update(
        &self,
        id: ReviewId,
        content: &str,
        score: i32,
    ) -> Result<Review, RepositoryError> {
        let updated = sqlx::query(
            "UPDATE shop.review SET content = $2, score = $3, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(content)
        .bind(score)
        .execute(self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist.
    pub async fn delete(&self, id: ReviewId) -> Result<(), RepositoryError> {
        let deleted = sqlx::query("DELETE FROM shop.review WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
