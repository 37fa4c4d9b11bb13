//! Comment repository.

use sqlx::PgPool;

use modish_core::{BoardId, CommentId, UserId};

use super::RepositoryError;
use crate::models::comment::Comment;

const COMMENT_SELECT: &str = r"
    SELECT c.id, c.board_id, c.writer_id, u.username AS writer_name, c.body,
           c.is_deleted, c.created_at, c.updated_at
    FROM shop.comment c
    JOIN shop.user u ON u.id = c.writer_id
";

/// Repository for comment database operations.
pub struct CommentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CommentRepository<'a> {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Live comments on a post, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_board(&self, board_id: BoardId) -> Result<Vec<Comment>, RepositoryError> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            "{COMMENT_SELECT} WHERE c.board_id = $1 AND NOT c.is_deleted \
             ORDER BY c.created_at, c.id"
        ))
        .bind(board_id)
        .fetch_all(self.pool)
        .await?;
        Ok(comments)
    }

    /// Get a comment by ID, deleted or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError> {
        let comment = sqlx::query_as::<_, Comment>(&format!("{COMMENT_SELECT} WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(comment)
    }

    /// Add a comment to a live post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the post doesn't exist or is deleted.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        board_id: BoardId,
        writer_id: UserId,
        body: &str,
    ) -> Result<Comment, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let live: Option<bool> =
            sqlx::query_scalar("SELECT NOT is_deleted FROM shop.board WHERE id = $1 FOR SHARE")
                .bind(board_id)
                .fetch_optional(&mut *tx)
                .await?;
        if live != Some(true) {
            return Err(RepositoryError::NotFound);
        }

        let id: CommentId = sqlx::query_scalar(
            "INSERT INTO shop.comment (board_id, writer_id, body) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(board_id)
        .bind(writer_id)
        .bind(body)
        .fetch_one(&mut *tx)
        .await?;

        let comment = sqlx::query_as::<_, Comment>(&format!("{COMMENT_SELECT} WHERE c.id = $1"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(comment)
    }

    /// Replace a live comment's text.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the comment doesn't exist or is deleted.
    pub async fn update(&self, id: CommentId, body: &str) -> Result<Comment, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE shop.comment SET body = $2, updated_at = now() \
             WHERE id = $1 AND NOT is_deleted",
        )
        .bind(id)
        .bind(body)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }

        let comment = sqlx::query_as::<_, Comment>(&format!("{COMMENT_SELECT} WHERE c.id = $1"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(comment)
    }

    /// Mark a comment deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the comment doesn't exist or is
    /// already deleted.
    pub async fn soft_delete(&self, id: CommentId) -> Result<(), RepositoryError> {
        let updated = sqlx::query(
            "UPDATE shop.comment SET is_deleted = TRUE, updated_at = now() \
             WHERE id = $1 AND NOT is_deleted",
        )
        .bind(id)
        .execute(self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
