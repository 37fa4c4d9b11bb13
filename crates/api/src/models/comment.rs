//! Board comment types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use modish_core::{BoardId, CommentId, UserId};

use super::board::serialize_yn;

/// A comment joined to its writer's name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comment {
    #[serde(rename = "co_no")]
    pub id: CommentId,
    #[serde(rename = "board_no")]
    pub board_id: BoardId,
    pub writer_id: UserId,
    pub writer_name: String,
    #[serde(rename = "co_comment")]
    pub body: String,
    #[serde(rename = "del_yn", serialize_with = "serialize_yn")]
    pub is_deleted: bool,
    #[serde(rename = "co_reg_date")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "co_mod_date")]
    pub updated_at: DateTime<Utc>,
}

/// Body of comment create/update requests.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub co_comment: String,
}

impl CommentRequest {
    /// Trimmed comment text, `None` when blank.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        let body = self.co_comment.trim();
        (!body.is_empty()).then_some(body)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_json_shape() {
        let now = Utc::now();
        let comment = Comment {
            id: CommentId::new(11),
            board_id: BoardId::new(5),
            writer_id: UserId::new(1),
            writer_name: "Kim".to_string(),
            body: "Thanks!".to_string(),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&comment).unwrap();
        assert_eq!(json["co_no"], 11);
        assert_eq!(json["board_no"], 5);
        assert_eq!(json["co_comment"], "Thanks!");
        assert_eq!(json["del_yn"], "N");
    }

    #[test]
    fn test_blank_body() {
        let request = CommentRequest {
            co_comment: "   ".to_string(),
        };
        assert_eq!(request.body(), None);
    }
}
