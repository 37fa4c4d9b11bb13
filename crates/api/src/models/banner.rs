//! Home page banner types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use modish_core::BannerId;

/// A home page banner.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: BannerId,
    pub image_url: String,
    pub title: String,
    pub link_url: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// JSON `data` part of banner create/update requests.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub display_order: Option<i32>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Validated banner fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerInput {
    pub title: String,
    pub link_url: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
}

impl BannerForm {
    /// Apply defaults (`displayOrder` 0, active) and require a title.
    ///
    /// # Errors
    ///
    /// Returns the message to show the client.
    pub fn validate(self) -> Result<BannerInput, &'static str> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return Err("title is required");
        }
        Ok(BannerInput {
            title,
            link_url: self
                .link_url
                .map(|url| url.trim().to_owned())
                .filter(|url| !url.is_empty()),
            display_order: self.display_order.unwrap_or(0),
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_defaults() {
        let form: BannerForm =
            serde_json::from_value(serde_json::json!({"title": " Summer sale ", "linkUrl": ""}))
                .unwrap();
        let input = form.validate().unwrap();

        assert_eq!(input.title, "Summer sale");
        assert_eq!(input.link_url, None);
        assert_eq!(input.display_order, 0);
        assert!(input.is_active);
    }

    #[test]
    fn test_validate_requires_title() {
        let form: BannerForm = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(form.validate().is_err());
    }
}
