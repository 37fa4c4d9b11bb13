//! Catalog item types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

use modish_core::{Color, ItemId, ItemSize, real_price};

/// A catalog item row.
#[derive(Debug, Clone, FromRow)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub description: String,
    pub brand: String,
    /// List price in won.
    pub price: i32,
    /// Discount in percent, `0..=100`.
    pub discount_percent: i32,
    pub stock: i32,
    pub sku: String,
    pub main_image_url: Option<String>,
    pub major_category: Option<String>,
    pub middle_category: Option<String>,
    pub subcategory: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A listing row with the caller's favorite/cart flags.
#[derive(Debug, Clone, FromRow)]
pub struct ItemSummaryRow {
    pub id: ItemId,
    pub title: String,
    pub brand: String,
    pub price: i32,
    pub discount_percent: i32,
    pub main_image_url: Option<String>,
    pub is_favorite: bool,
    pub is_cart: bool,
}

/// Item as shown in catalog, favorites and cart listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub id: ItemId,
    pub title: String,
    pub brand: String,
    pub price: i32,
    pub discount_percent: i32,
    pub real_price: i64,
    pub main_image_url: Option<String>,
    pub is_favorite: bool,
    pub is_cart: bool,
}

impl From<ItemSummaryRow> for ItemSummary {
    fn from(row: ItemSummaryRow) -> Self {
        Self {
            id: row.id,
            real_price: real_price(row.price, row.discount_percent),
            title: row.title,
            brand: row.brand,
            price: row.price,
            discount_percent: row.discount_percent,
            main_image_url: row.main_image_url,
            is_favorite: row.is_favorite,
            is_cart: row.is_cart,
        }
    }
}

/// Aggregates shown on the item detail page.
#[derive(Debug, Clone, Copy, Default, FromRow)]
pub struct ItemStats {
    pub like_count: i64,
    pub review_count: i64,
    /// Mean review score, `0.0` without reviews.
    pub score_average: f64,
    pub saved_in_likes: bool,
    pub saved_in_cart: bool,
}

/// Item detail payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail {
    pub id: ItemId,
    pub title: String,
    pub description: String,
    pub brand: String,
    pub price: i32,
    pub discount_percent: i32,
    pub real_price: i64,
    pub stock: i32,
    pub sku: String,
    /// `true` while the item is in stock.
    pub status: bool,
    pub main_image_url: Option<String>,
    pub image_list: Vec<String>,
    pub color_list: Vec<Color>,
    pub size_list: Vec<ItemSize>,
    pub like_count: i64,
    pub review_count: i64,
    pub score_average: f64,
    pub saved_in_likes: bool,
    pub saved_in_cart: bool,
    pub major_category: Option<String>,
    pub middle_category: Option<String>,
    pub subcategory: Option<String>,
}

impl ItemDetail {
    /// Assemble the detail payload from the item row and its children.
    #[must_use]
    pub fn new(
        item: Item,
        image_list: Vec<String>,
        color_list: Vec<Color>,
        size_list: Vec<ItemSize>,
        stats: ItemStats,
    ) -> Self {
        Self {
            id: item.id,
            real_price: real_price(item.price, item.discount_percent),
            status: item.stock > 0,
            title: item.title,
            description: item.description,
            brand: item.brand,
            price: item.price,
            discount_percent: item.discount_percent,
            stock: item.stock,
            sku: item.sku,
            main_image_url: item.main_image_url,
            image_list,
            color_list,
            size_list,
            like_count: stats.like_count,
            review_count: stats.review_count,
            score_average: stats.score_average,
            saved_in_likes: stats.saved_in_likes,
            saved_in_cart: stats.saved_in_cart,
            major_category: item.major_category,
            middle_category: item.middle_category,
            subcategory: item.subcategory,
        }
    }
}

/// Invalid admin item input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemFormError {
    #[error("title is required")]
    MissingTitle,
    #[error("price must not be negative")]
    NegativePrice,
    #[error("discountPercent must be between 0 and 100")]
    DiscountOutOfRange,
    #[error("stock must not be negative")]
    NegativeStock,
}

/// JSON `data` part of the admin create/update multipart request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemForm {
    pub title: String,
    pub price: i32,
    #[serde(default)]
    pub discount_percent: i32,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub color_list: Vec<Color>,
    #[serde(default)]
    pub size_list: Vec<ItemSize>,
    #[serde(default)]
    pub major_category: Option<String>,
    #[serde(default)]
    pub middle_category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
}

/// Validated, normalised item fields ready for the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemInput {
    pub title: String,
    pub price: i32,
    pub discount_percent: i32,
    pub brand: String,
    pub description: String,
    pub stock: i32,
    pub sku: String,
    pub colors: Vec<Color>,
    pub sizes: Vec<ItemSize>,
    pub major_category: Option<String>,
    pub middle_category: Option<String>,
    pub subcategory: Option<String>,
}

impl ItemForm {
    /// Validate the form, normalise categories and fill in a missing SKU.
    ///
    /// # Errors
    ///
    /// Returns `ItemFormError` for a blank title, a negative price or stock,
    /// or a discount outside `0..=100`.
    pub fn validate(self, now_millis: i64) -> Result<ItemInput, ItemFormError> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return Err(ItemFormError::MissingTitle);
        }
        if self.price < 0 {
            return Err(ItemFormError::NegativePrice);
        }
        if !(0..=100).contains(&self.discount_percent) {
            return Err(ItemFormError::DiscountOutOfRange);
        }
        if self.stock < 0 {
            return Err(ItemFormError::NegativeStock);
        }

        let major_category = normalize_category(self.major_category.as_deref());
        let middle_category = normalize_category(self.middle_category.as_deref());
        let subcategory = normalize_category(self.subcategory.as_deref());

        let sku = match self.sku.as_deref().map(str::trim) {
            Some(sku) if !sku.is_empty() => sku.to_owned(),
            _ => generate_sku(
                major_category.as_deref(),
                middle_category.as_deref(),
                subcategory.as_deref(),
                now_millis,
            ),
        };

        Ok(ItemInput {
            title,
            price: self.price,
            discount_percent: self.discount_percent,
            brand: self.brand.trim().to_owned(),
            description: self.description,
            stock: self.stock,
            sku,
            colors: dedup(self.color_list),
            sizes: dedup(self.size_list),
            major_category,
            middle_category,
            subcategory,
        })
    }
}

/// Trim and uppercase a category code; blank becomes `None`.
#[must_use]
pub fn normalize_category(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
}

/// `{MAJOR|NONE}-{MIDDLE|NONE}-{SUB|NONE}-{unix millis}`.
#[must_use]
pub fn generate_sku(
    major: Option<&str>,
    middle: Option<&str>,
    sub: Option<&str>,
    now_millis: i64,
) -> String {
    format!(
        "{}-{}-{}-{now_millis}",
        major.unwrap_or("NONE"),
        middle.unwrap_or("NONE"),
        sub.unwrap_or("NONE"),
    )
}

fn dedup<T: PartialEq>(values: Vec<T>) -> Vec<T> {
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}
