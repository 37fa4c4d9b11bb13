//! JSON response envelope shared by every `/api` endpoint.
//!
//! Successful responses are `200 {"success": true, "data": ..., "message": ...}`;
//! failures are rendered by [`crate::error::AppError`] with the same shape.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Page size used when the client does not ask for one.
pub const DEFAULT_PAGE_SIZE: i64 = 10;
/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// The `{success, data, message}` envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response carrying `data`.
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    /// Successful response carrying `data` and a human-readable message.
    #[must_use]
    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }
}

impl ApiResponse<()> {
    /// Successful response with no payload.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }

    /// Failure body; the status code is chosen by the caller.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// One page of a 0-based paged listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    /// Build a page, deriving `total_pages` from the element count.
    #[must_use]
    pub fn new(content: Vec<T>, page: i64, size: i64, total_elements: i64) -> Self {
        Self {
            content,
            page,
            size,
            total_elements,
            total_pages: total_pages(total_elements, size),
        }
    }
}

/// `?page=&size=` query parameters of a 0-based paged listing.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub size: Option<i64>,
}

impl PageRequest {
    /// Build a request from raw values.
    #[must_use]
    pub const fn new(page: Option<i64>, size: Option<i64>) -> Self {
        Self { page, size }
    }

    /// 0-based page number; negative values become 0.
    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(0).max(0)
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn size(&self) -> i64 {
        self.size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Row offset of the first element on this page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        self.page().saturating_mul(self.size())
    }
}

/// Number of pages needed for `total` rows at `size` rows per page.
#[must_use]
pub const fn total_pages(total: i64, size: i64) -> i64 {
    if size <= 0 || total <= 0 {
        0
    } else {
        (total + size - 1) / size
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults_and_clamping() {
        let default = PageRequest::default();
        assert_eq!((default.page(), default.size(), default.offset()), (0, 10, 0));

        let request = PageRequest::new(Some(3), Some(20));
        assert_eq!(request.offset(), 60);

        let request = PageRequest::new(Some(-2), Some(500));
        assert_eq!((request.page(), request.size()), (0, MAX_PAGE_SIZE));

        assert_eq!(PageRequest::new(None, Some(0)).size(), 1);
    }

    #[test]
    fn test_ok_envelope_shape() {
        let json = serde_json::to_value(ApiResponse::ok(42)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": true, "data": 42, "message": null})
        );
    }

    #[test]
    fn test_failure_envelope_shape() {
        let json = serde_json::to_value(ApiResponse::failure("nope")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": false, "data": null, "message": "nope"})
        );
    }

    #[test]
    fn test_page_serializes_camel_case() {
        let page = Page::new(vec!["a", "b"], 0, 10, 12);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalElements"], 12);
        assert_eq!(json["totalPages"], 2);
        assert_eq!(json["content"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(5, 0), 0);
    }
}
