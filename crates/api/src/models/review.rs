//! Item review types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use modish_core::{ItemId, ReviewId, UserId};

/// A review joined to its author's name.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub review_id: ReviewId,
    #[serde(skip)]
    pub item_id: ItemId,
    pub user_id: UserId,
    pub username: String,
    pub content: String,
    pub score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of review create/update requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: i32,
}

impl ReviewRequest {
    /// Check the score range and that the content is not blank.
    ///
    /// # Errors
    ///
    /// Returns the message to show the client.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(1..=5).contains(&self.score) {
            return Err("score must be between 1 and 5");
        }
        if self.content.trim().is_empty() {
            return Err("content is required");
        }
        Ok(())
    }
}
