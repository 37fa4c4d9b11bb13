//! Order types.
//!
//! An order is a frozen snapshot of the cart at checkout: line titles and
//! unit prices are copied, so later catalog changes never alter it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use modish_core::{
    Color, ItemId, ItemSize, OrderId, OrderStatus, PriceError, line_total, real_price,
};

/// Body of `POST /api/order`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderRequest {
    #[serde(default)]
    pub addr: String,
    #[serde(default)]
    pub call: String,
    #[serde(default)]
    pub zipcode: String,
}

impl OrderRequest {
    /// Name of the first blank shipping field, if any.
    #[must_use]
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("addr", &self.addr),
            ("call", &self.call),
            ("zipcode", &self.zipcode),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// A cart line joined to the item's current price, read at checkout.
#[derive(Debug, Clone, FromRow)]
pub struct CartLine {
    pub item_id: ItemId,
    pub title: String,
    pub main_image_url: Option<String>,
    pub price: i32,
    pub discount_percent: i32,
    pub number: i32,
    pub color: Option<Color>,
    pub size: Option<ItemSize>,
}

impl CartLine {
    /// Unit price at checkout.
    #[must_use]
    pub fn unit_price(&self) -> i64 {
        real_price(self.price, self.discount_percent)
    }
}

/// Sum of `realPrice * quantity` over the lines.
///
/// # Errors
///
/// Returns [`PriceError::Overflow`] if the total does not fit in an `i64`.
pub fn order_total(lines: &[CartLine]) -> Result<i64, PriceError> {
    lines.iter().try_fold(0_i64, |total, line| {
        let line = line_total(line.price, line.discount_percent, line.number)?;
        total.checked_add(line).ok_or(PriceError::Overflow)
    })
}

/// Response of `POST /api/order`.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub total_price: i64,
}

/// Order listing row.
#[derive(Debug, Clone, FromRow)]
pub struct OrderSummaryRow {
    pub id: OrderId,
    pub total_price: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub first_title: Option<String>,
    pub first_image_url: Option<String>,
    pub line_count: i64,
}

/// Order as shown in the order history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub title: String,
    pub main_img_url: Option<String>,
    pub total_price: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl From<OrderSummaryRow> for OrderSummary {
    fn from(row: OrderSummaryRow) -> Self {
        Self {
            order_id: row.id,
            title: summary_title(row.first_title.as_deref().unwrap_or_default(), row.line_count),
            main_img_url: row.first_image_url,
            total_price: row.total_price,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

/// First line's title, with ` and N more` when there are more lines.
#[must_use]
pub fn summary_title(first_title: &str, line_count: i64) -> String {
    if line_count > 1 {
        format!("{first_title} and {} more", line_count - 1)
    } else {
        first_title.to_owned()
    }
}

/// An order row joined to the buyer's name.
#[derive(Debug, Clone, FromRow)]
pub struct Order {
    pub id: OrderId,
    pub total_price: i64,
    pub addr: String,
    pub call: String,
    pub zipcode: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub username: String,
}

/// A snapshotted order line.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// `None` once the item was deleted from the catalog.
    pub item_id: Option<ItemId>,
    pub title: String,
    pub main_img_url: Option<String>,
    pub number: i32,
    pub color: Option<Color>,
    pub size: Option<ItemSize>,
    pub unit_price: i64,
}

/// Order detail payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub order_id: OrderId,
    pub items: Vec<OrderLine>,
    pub total_price: i64,
    pub addr: String,
    pub call: String,
    pub zipcode: String,
    pub username: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl OrderDetail {
    #[must_use]
    pub fn new(order: Order, items: Vec<OrderLine>) -> Self {
        Self {
            order_id: order.id,
            items,
            total_price: order.total_price,
            addr: order.addr,
            call: order.call,
            zipcode: order.zipcode,
            username: order.username,
            status: order.status,
            created_at: order.created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(price: i32, discount_percent: i32, number: i32) -> CartLine {
        CartLine {
            item_id: ItemId::new(1),
            title: "Tee".to_string(),
            main_image_url: None,
            price,
            discount_percent,
            number,
            color: Some(Color::White),
            size: None,
        }
    }

    #[test]
    fn test_order_total_uses_real_price() {
        let lines = [line(10_000, 15, 2), line(999, 10, 3)];
        assert_eq!(order_total(&lines).unwrap(), 8_500 * 2 + 900 * 3);
        assert_eq!(order_total(&[]).unwrap(), 0);
    }

    #[test]
    fn test_order_total_overflow() {
        let lines = vec![line(i32::MAX, 0, i32::MAX); 3];
        assert_eq!(order_total(&lines), Err(PriceError::Overflow));
    }

    #[test]
    fn test_summary_title() {
        assert_eq!(summary_title("Coat", 1), "Coat");
        assert_eq!(summary_title("Coat", 3), "Coat and 2 more");
        assert_eq!(summary_title("", 0), "");
    }

    #[test]
    fn test_missing_field() {
        let request = OrderRequest {
            addr: "Seoul".to_string(),
            call: " ".to_string(),
            zipcode: "04524".to_string(),
        };
        assert_eq!(request.missing_field(), Some("call"));
    }
}
