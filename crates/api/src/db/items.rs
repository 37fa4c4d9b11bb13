//! Item repository: detail reads, favorite/cart toggles and admin writes.

use sqlx::{PgConnection, PgPool};

use modish_core::{Color, ItemId, ItemSize, UserId};

use super::RepositoryError;
use crate::models::item::{Item, ItemInput, ItemStats};

/// Image URLs an item no longer references after an update or delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleasedImages {
    pub urls: Vec<String>,
}

/// Repository for item database operations.
pub struct ItemRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ItemRepository<'a> {
    /// Create a new item repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an item by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        let item = sqlx::query_as::<_, Item>(
            r"
            SELECT id, title, description, brand, price, discount_percent, stock, sku,
                   main_image_url, major_category, middle_category, subcategory,
                   created_at, updated_at
            FROM shop.item
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(item)
    }

    /// Whether an item exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: ItemId) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM shop.item WHERE id = $1)")
                .bind(id)
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    /// Gallery image URLs in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn images(&self, id: ItemId) -> Result<Vec<String>, RepositoryError> {
        let urls = sqlx::query_scalar(
            "SELECT url FROM shop.item_image WHERE item_id = $1 ORDER BY position, id",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;
        Ok(urls)
    }

    /// Color variants in enum order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn colors(&self, id: ItemId) -> Result<Vec<Color>, RepositoryError> {
        let colors = sqlx::query_scalar(
            "SELECT color FROM shop.item_color WHERE item_id = $1 ORDER BY color",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;
        Ok(colors)
    }

    /// Size variants in enum order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sizes(&self, id: ItemId) -> Result<Vec<ItemSize>, RepositoryError> {
        let sizes =
            sqlx::query_scalar("SELECT size FROM shop.item_size WHERE item_id = $1 ORDER BY size")
                .bind(id)
                .fetch_all(self.pool)
                .await?;
        Ok(sizes)
    }

    /// Like/review aggregates and the viewer's saved flags.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(
        &self,
        id: ItemId,
        viewer: Option<UserId>,
    ) -> Result<ItemStats, RepositoryError> {
        let stats = sqlx::query_as::<_, ItemStats>(
            r"
            SELECT
                (SELECT COUNT(*) FROM shop.favorite_item WHERE item_id = $1) AS like_count,
                (SELECT COUNT(*) FROM shop.review WHERE item_id = $1) AS review_count,
                COALESCE((SELECT AVG(score)::float8 FROM shop.review WHERE item_id = $1), 0)
                    AS score_average,
                EXISTS (SELECT 1 FROM shop.favorite_item WHERE item_id = $1 AND user_id = $2)
                    AS saved_in_likes,
                EXISTS (SELECT 1 FROM shop.cart_item WHERE item_id = $1 AND user_id = $2)
                    AS saved_in_cart
            ",
        )
        .bind(id)
        .bind(viewer)
        .fetch_one(self.pool)
        .await?;

        Ok(stats)
    }

    /// Add or remove a favorite. Returns `true` when the item is now a favorite.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn toggle_favorite(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_item(&mut tx, item_id).await?;

        let removed = sqlx::query(
            "DELETE FROM shop.favorite_item WHERE user_id = $1 AND item_id = $2",
        )
        .bind(user_id)
        .bind(item_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if removed == 0 {
            sqlx::query(
                r"
                INSERT INTO shop.favorite_item (user_id, item_id)
                VALUES ($1, $2)
                ON CONFLICT (user_id, item_id) DO NOTHING
                ",
            )
            .bind(user_id)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(removed == 0)
    }

    /// Add or remove a cart line. A new line has quantity 1 and the item's
    /// first color and size. Returns `true` when the item is now in the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn toggle_cart(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_item(&mut tx, item_id).await?;

        let removed = sqlx::query("DELETE FROM shop.cart_item WHERE user_id = $1 AND item_id = $2")
            .bind(user_id)
            .bind(item_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            sqlx::query(
                r"
                INSERT INTO shop.cart_item (user_id, item_id, color, size, number)
                VALUES (
                    $1, $2,
                    (SELECT color FROM shop.item_color WHERE item_id = $2 ORDER BY color LIMIT 1),
                    (SELECT size FROM shop.item_size WHERE item_id = $2 ORDER BY size LIMIT 1),
                    1
                )
                ON CONFLICT (user_id, item_id) DO NOTHING
                ",
            )
            .bind(user_id)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(removed == 0)
    }

    /// Create an item with its variants and images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if an insert fails.
    #[tracing::instrument(skip(self, input, images), fields(sku = %input.sku))]
    pub async fn create(
        &self,
        input: &ItemInput,
        main_image_url: Option<&str>,
        images: &[String],
    ) -> Result<ItemId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: ItemId = sqlx::query_scalar(
            r"
            INSERT INTO shop.item
                (title, description, brand, price, discount_percent, stock, sku,
                 main_image_url, major_category, middle_category, subcategory)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            ",
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.brand)
        .bind(input.price)
        .bind(input.discount_percent)
        .bind(input.stock)
        .bind(&input.sku)
        .bind(main_image_url)
        .bind(&input.major_category)
        .bind(&input.middle_category)
        .bind(&input.subcategory)
        .fetch_one(&mut *tx)
        .await?;

        replace_variants(&mut tx, id, &input.colors, &input.sizes).await?;
        insert_images(&mut tx, id, images).await?;

        tx.commit().await?;
        tracing::info!(item_id = %id, "Item created");
        Ok(id)
    }

    /// Update an item's fields and replace its variants. A provided main
    /// image or image list replaces the stored one; the replaced URLs are
    /// returned so their files can be removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[tracing::instrument(skip(self, input, main_image_url, images))]
    pub async fn update(
        &self,
        id: ItemId,
        input: &ItemInput,
        main_image_url: Option<&str>,
        images: Option<&[String]>,
    ) -> Result<ReleasedImages, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut released = ReleasedImages::default();

        let old_main: Option<String> = lock_item(&mut tx, id).await?;
        if main_image_url.is_some()
            && let Some(old) = old_main
        {
            released.urls.push(old);
        }

        sqlx::query(
            r"
            UPDATE shop.item
            SET title = $2, description = $3, brand = $4, price = $5, discount_percent = $6,
                stock = $7, sku = $8, main_image_url = COALESCE($9, main_image_url),
                major_category = $10, middle_category = $11, subcategory = $12,
                updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.brand)
        .bind(input.price)
        .bind(input.discount_percent)
        .bind(input.stock)
        .bind(&input.sku)
        .bind(main_image_url)
        .bind(&input.major_category)
        .bind(&input.middle_category)
        .bind(&input.subcategory)
        .execute(&mut *tx)
        .await?;

        replace_variants(&mut tx, id, &input.colors, &input.sizes).await?;

        if let Some(images) = images {
            let old: Vec<String> =
                sqlx::query_scalar("DELETE FROM shop.item_image WHERE item_id = $1 RETURNING url")
                    .bind(id)
                    .fetch_all(&mut *tx)
                    .await?;
            released.urls.extend(old);
            insert_images(&mut tx, id, images).await?;
        }

        tx.commit().await?;
        Ok(released)
    }

    /// Delete an item. Images, variants, favorites, cart lines and reviews
    /// cascade; order lines keep their snapshot. Returns the item's image URLs.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: ItemId) -> Result<ReleasedImages, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let mut urls: Vec<String> =
            sqlx::query_scalar("SELECT url FROM shop.item_image WHERE item_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        let main: Option<Option<String>> =
            sqlx::query_scalar("DELETE FROM shop.item WHERE id = $1 RETURNING main_image_url")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(main) = main else {
            return Err(RepositoryError::NotFound);
        };
        urls.extend(main);

        tx.commit().await?;
        tracing::info!(item_id = %id, "Item deleted");
        Ok(ReleasedImages { urls })
    }
}

/// Lock an item row for the rest of the transaction, returning its main image URL.
async fn lock_item(conn: &mut PgConnection, id: ItemId) -> Result<Option<String>, RepositoryError> {
    let row: Option<Option<String>> =
        sqlx::query_scalar("SELECT main_image_url FROM shop.item WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
    row.ok_or(RepositoryError::NotFound)
}

async fn replace_variants(
    conn: &mut PgConnection,
    id: ItemId,
    colors: &[Color],
    sizes: &[ItemSize],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM shop.item_color WHERE item_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    for color in colors {
        sqlx::query("INSERT INTO shop.item_color (item_id, color) VALUES ($1, $2)")
            .bind(id)
            .bind(color)
            .execute(&mut *conn)
            .await?;
    }

    sqlx::query("DELETE FROM shop.item_size WHERE item_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    for size in sizes {
        sqlx::query("INSERT INTO shop.item_size (item_id, size) VALUES ($1, $2)")
            .bind(id)
            .bind(size)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

async fn insert_images(
    conn: &mut PgConnection,
    id: ItemId,
    urls: &[String],
) -> Result<(), RepositoryError> {
    for (position, url) in (0_i32..).zip(urls) {
        sqlx::query("INSERT INTO shop.item_image (item_id, url, position) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(url)
            .bind(position)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}
