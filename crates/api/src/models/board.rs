//! Discussion board types.
//!
//! Board and comment JSON is `snake_case` with `"Y"`/`"N"` flags, unlike the
//! rest of the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use sqlx::FromRow;

use modish_core::{BoardFileId, BoardId, UserId};

/// Posts per board page.
pub const BOARD_PAGE_SIZE: i64 = 10;

/// Title shown for secret posts to readers who may not open them.
pub const SECRET_TITLE: &str = "Secret post";

/// Serialize a flag as `"Y"` / `"N"`.
#[allow(clippy::trivially_copy_pass_by_ref)]
pub fn serialize_yn<S: Serializer>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *flag { "Y" } else { "N" })
}

/// Parse a `secretYn`-style form value.
#[must_use]
pub fn parse_yn(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_uppercase().as_str(), "Y" | "YES" | "TRUE" | "1")
}

/// A board post joined to its writer and comment count.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BoardPost {
    #[serde(rename = "board_no")]
    pub id: BoardId,
    pub writer_id: UserId,
    pub writer_name: String,
    #[serde(rename = "board_category")]
    pub category: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "view")]
    pub views: i64,
    #[serde(rename = "secret_yn", serialize_with = "serialize_yn")]
    pub is_secret: bool,
    #[serde(rename = "del_yn", serialize_with = "serialize_yn")]
    pub is_deleted: bool,
    #[serde(rename = "reg_date")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "mod_date")]
    pub updated_at: DateTime<Utc>,
    pub comment_count: i64,
    #[sqlx(skip)]
    pub files: Vec<BoardFile>,
}

impl BoardPost {
    /// Whether `reader` may see the title and content.
    #[must_use]
    pub fn readable_by(&self, reader: Option<(UserId, bool)>) -> bool {
        !self.is_secret
            || reader.is_some_and(|(user_id, is_admin)| is_admin || user_id == self.writer_id)
    }

    /// Hide the title and content of a secret post.
    #[must_use]
    pub fn masked(mut self) -> Self {
        SECRET_TITLE.clone_into(&mut self.title);
        self.content.clear();
        self.files.clear();
        self
    }
}

/// An attachment stored for a board post.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BoardFile {
    #[serde(rename = "file_no")]
    pub id: BoardFileId,
    #[serde(rename = "board_no")]
    pub board_id: BoardId,
    pub origin_filename: String,
    pub save_filename: String,
    pub file_size: i64,
    pub file_ext: String,
    #[serde(rename = "reg_date")]
    pub created_at: DateTime<Utc>,
}

/// `GET /api/board/list` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoardListQuery {
    /// 1-based page number.
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub keyword: Option<String>,
}

impl BoardListQuery {
    /// 1-based page, at least 1.
    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// One page of the board listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardPage {
    pub list: Vec<BoardPost>,
    pub total_pages: i64,
    pub total_elements: i64,
    pub current_page: i64,
}

/// Validated post fields from the write/edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostInput {
    pub category: String,
    pub title: String,
    pub content: String,
    pub is_secret: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn post(is_secret: bool) -> BoardPost {
        let now = Utc::now();
        BoardPost {
            id: BoardId::new(5),
            writer_id: UserId::new(1),
            writer_name: "Kim".to_string(),
            category: "QNA".to_string(),
            title: "Size question".to_string(),
            content: "Does M fit?".to_string(),
            views: 3,
            is_secret,
            is_deleted: false,
            created_at: now,
            updated_at: now,
            comment_count: 2,
            files: Vec::new(),
        }
    }

    #[test]
    fn test_post_json_shape() {
        let json = serde_json::to_value(post(true)).unwrap();
        assert_eq!(json["board_no"], 5);
        assert_eq!(json["board_category"], "QNA");
        assert_eq!(json["view"], 3);
        assert_eq!(json["secret_yn"], "Y");
        assert_eq!(json["del_yn"], "N");
        assert!(json["reg_date"].is_string());
        assert_eq!(json["comment_count"], 2);
    }

    #[test]
    fn test_readable_by() {
        assert!(post(false).readable_by(None));

        let secret = post(true);
        assert!(!secret.readable_by(None));
        assert!(!secret.readable_by(Some((UserId::new(2), false))));
        assert!(secret.readable_by(Some((UserId::new(1), false))));
        assert!(secret.readable_by(Some((UserId::new(2), true))));
    }

    #[test]
    fn test_masked() {
        let masked = post(true).masked();
        assert_eq!(masked.title, SECRET_TITLE);
        assert!(masked.content.is_empty());
    }

    #[test]
    fn test_parse_yn() {
        assert!(parse_yn("Y"));
        assert!(parse_yn("y"));
        assert!(!parse_yn("N"));
        assert!(!parse_yn(""));
    }

    #[test]
    fn test_list_query_defaults() {
        let query = BoardListQuery {
            page: Some(0),
            category: Some("  ".to_string()),
            keyword: Some(" coat ".to_string()),
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.category(), None);
        assert_eq!(query.keyword(), Some("coat"));
    }
}
