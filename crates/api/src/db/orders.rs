//! Order repository: checkout and order history.

use sqlx::PgPool;
use thiserror::Error;

use modish_core::{OrderId, OrderStatus, PriceError, UserId};

use super::RepositoryError;
use crate::models::order::{
    CartLine, Order, OrderLine, OrderRequest, OrderSummaryRow, PlacedOrder, order_total,
};
use crate::response::PageRequest;

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("order total is too large")]
    Total(#[from] PriceError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn the user's cart into an order and empty the cart, atomically.
    ///
    /// Unit prices and titles are snapshotted at this moment.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::EmptyCart` for an empty cart, `OrderError::Total`
    /// if the total overflows, and `OrderError::Repository` for database errors.
    #[tracing::instrument(skip(self, request))]
    pub async fn place(
        &self,
        user_id: UserId,
        request: &OrderRequest,
    ) -> Result<PlacedOrder, OrderError> {
        let mut tx = self.pool.begin().await?;

        let lines = sqlx::query_as::<_, CartLine>(
            r"
            SELECT c.item_id, i.title, i.main_image_url, i.price, i.discount_percent,
                   c.number, c.color, c.size
            FROM shop.cart_item c
            JOIN shop.item i ON i.id = c.item_id
            WHERE c.user_id = $1
            ORDER BY c.id
            FOR UPDATE OF c
            ",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        let total_price = order_total(&lines)?;

        let order_id: OrderId = sqlx::query_scalar(
            r"
            INSERT INTO shop.order (user_id, total_price, addr, call, zipcode, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(total_price)
        .bind(request.addr.trim())
        .bind(request.call.trim())
        .bind(request.zipcode.trim())
        .bind(OrderStatus::Paid)
        .fetch_one(&mut *tx)
        .await?;

        for line in &lines {
            sqlx::query(
                r"
                INSERT INTO shop.order_item
                    (order_id, item_id, title, main_image_url, unit_price, number, color, size)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(order_id)
            .bind(line.item_id)
            .bind(&line.title)
            .bind(&line.main_image_url)
            .bind(line.unit_price())
            .bind(line.number)
            .bind(line.color)
            .bind(line.size)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM shop.cart_item WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(order_id = %order_id, total_price, lines = lines.len(), "Order placed");

        Ok(PlacedOrder {
            order_id,
            total_price,
        })
    }

    /// A page of the user's orders, newest first, and the total order count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<(Vec<OrderSummaryRow>, i64), RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shop.order WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;

        let rows = sqlx::query_as::<_, OrderSummaryRow>(
            r"
            SELECT o.id, o.total_price, o.status, o.created_at,
                   first_line.title AS first_title,
                   first_line.main_image_url AS first_image_url,
                   (SELECT COUNT(*) FROM shop.order_item oi WHERE oi.order_id = o.id) AS line_count
            FROM shop.order o
            LEFT JOIN LATERAL (
                SELECT oi.title, oi.main_image_url
                FROM shop.order_item oi
                WHERE oi.order_id = o.id
                ORDER BY oi.id
                LIMIT 1
            ) first_line ON TRUE
            WHERE o.user_id = $1
            ORDER BY o.id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user_id)
        .bind(page.size())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok((rows, total))
    }

    /// Get one of the user's orders. Other users' orders are not found.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r"
            SELECT o.id, o.total_price, o.addr, o.call, o.zipcode, o.status, o.created_at,
                   u.username
            FROM shop.order o
            JOIN shop.user u ON u.id = o.user_id
            WHERE o.id = $1 AND o.user_id = $2
            ",
        )
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Lines of an order in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, OrderLine>(
            r"
            SELECT item_id, title, main_image_url AS main_img_url, number, color, size, unit_price
            FROM shop.order_item
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(lines)
    }
}
