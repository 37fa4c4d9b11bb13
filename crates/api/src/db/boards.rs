//! Board repository: posts and their attachments.

use sqlx::{PgConnection, PgPool};

use modish_core::{BoardFileId, BoardId, UserId};

use super::{RepositoryError, escape_like};
use crate::models::board::{BOARD_PAGE_SIZE, BoardFile, BoardPost, PostInput};
use crate::services::uploads::StoredFile;

const POST_SELECT: &str = r"
    SELECT b.id, b.writer_id, u.username AS writer_name, b.category, b.title, b.content,
           b.views, b.is_secret, b.is_deleted, b.created_at, b.updated_at,
           (SELECT COUNT(*) FROM shop.comment c
            WHERE c.board_id = b.id AND NOT c.is_deleted) AS comment_count
    FROM shop.board b
    JOIN shop.user u ON u.id = b.writer_id
";

/// Repository for board database operations.
pub struct BoardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BoardRepository<'a> {
    /// Create a new board repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A 1-based page of live posts, newest first, and the total count.
    ///
    /// `keyword` matches the title or the content, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        category: Option<&str>,
        keyword: Option<&str>,
        page: i64,
    ) -> Result<(Vec<BoardPost>, i64), RepositoryError> {
        let pattern = keyword.map(|k| format!("%{}%", escape_like(&k.to_lowercase())));
        let offset = (page.max(1) - 1).saturating_mul(BOARD_PAGE_SIZE);

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM shop.board b
            WHERE NOT b.is_deleted
              AND ($1::text IS NULL OR b.category = $1)
              AND ($2::text IS NULL OR lower(b.title) LIKE $2 OR lower(b.content) LIKE $2)
            ",
        )
        .bind(category)
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        let posts = sqlx::query_as::<_, BoardPost>(&format!(
            r"
            {POST_SELECT}
            WHERE NOT b.is_deleted
              AND ($1::text IS NULL OR b.category = $1)
              AND ($2::text IS NULL OR lower(b.title) LIKE $2 OR lower(b.content) LIKE $2)
            ORDER BY b.id DESC
            LIMIT $3 OFFSET $4
            "
        ))
        .bind(category)
        .bind(pattern.as_deref())
        .bind(BOARD_PAGE_SIZE)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok((posts, total))
    }

    /// Get a post by ID, deleted or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: BoardId) -> Result<Option<BoardPost>, RepositoryError> {
        let post = sqlx::query_as::<_, BoardPost>(&format!("{POST_SELECT} WHERE b.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(post)
    }

    /// Count one more view of a live post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn increment_views(&self, id: BoardId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE shop.board SET views = views + 1 WHERE id = $1 AND NOT is_deleted")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Attachments of a post in upload order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn files(&self, board_id: BoardId) -> Result<Vec<BoardFile>, RepositoryError> {
        let files = sqlx::query_as::<_, BoardFile>(
            r"
            SELECT id, board_id, origin_filename, save_filename, file_size, file_ext, created_at
            FROM shop.board_file
            WHERE board_id = $1
            ORDER BY id
            ",
        )
        .bind(board_id)
        .fetch_all(self.pool)
        .await?;
        Ok(files)
    }

    /// Get an attachment whose post is not deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_live_file(
        &self,
        id: BoardFileId,
    ) -> Result<Option<BoardFile>, RepositoryError> {
        let file = sqlx::query_as::<_, BoardFile>(
            r"
            SELECT f.id, f.board_id, f.origin_filename, f.save_filename, f.file_size,
                   f.file_ext, f.created_at
            FROM shop.board_file f
            JOIN shop.board b ON b.id = f.board_id
            WHERE f.id = $1 AND NOT b.is_deleted
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(file)
    }

    /// Insert a post and its attachment rows in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if an insert fails.
    #[tracing::instrument(skip(self, input, files), fields(files = files.len()))]
    pub async fn create(
        &self,
        writer_id: UserId,
        input: &PostInput,
        files: &[StoredFile],
    ) -> Result<BoardId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: BoardId = sqlx::query_scalar(
            r"
            INSERT INTO shop.board (writer_id, category, title, content, is_secret)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(writer_id)
        .bind(&input.category)
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.is_secret)
        .fetch_one(&mut *tx)
        .await?;

        insert_files(&mut tx, id, files).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Update a post and append new attachments in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the post doesn't exist or is deleted.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: BoardId,
        input: &PostInput,
        files: &[StoredFile],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r"
            UPDATE shop.board
            SET category = $2, title = $3, content = $4, is_secret = $5, updated_at = now()
            WHERE id = $1 AND NOT is_deleted
            ",
        )
        .bind(id)
        .bind(&input.category)
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.is_secret)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }

        insert_files(&mut tx, id, files).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Mark a post deleted. Its id, files and comments stay in place.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the post doesn't exist or is
    /// already deleted.
    pub async fn soft_delete(&self, id: BoardId) -> Result<(), RepositoryError> {
        let updated = sqlx::query(
            "UPDATE shop.board SET is_deleted = TRUE, updated_at = now() \
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

async fn insert_files(
    conn: &mut PgConnection,
    board_id: BoardId,
    files: &[StoredFile],
) -> Result<(), RepositoryError> {
    for file in files {
        sqlx::query(
            r"
            INSERT INTO shop.board_file
                (board_id, origin_filename, save_filename, file_size, file_ext)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(board_id)
        .bind(&file.origin_filename)
        .bind(&file.save_filename)
        .bind(file.file_size)
        .bind(&file.file_ext)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
