//! Item review route handlers.

use axum::extract::State;
use modish_core::{ItemId, ReviewId};

use crate::db::reviews::ReviewRepository;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::models::review::{Review, ReviewRequest};
use crate::response::ApiResponse;
use crate::state::AppState;

fn validate(request: &ReviewRequest) -> Result<()> {
    request
        .validate()
        .map_err(|msg| AppError::BadRequest(msg.to_string()))
}

async fn existing(reviews: &ReviewRepository<'_>, id: ReviewId) -> Result<Review> {
    reviews
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Review {id} not found")))
}

/// Reviews of an item, newest first.
///
/// # Route
///
/// `GET /api/review/{itemId}`
pub async fn list(
    State(state): State<AppState>,
    ApiPath(item_id): ApiPath<ItemId>,
) -> Result<ApiResponse<Vec<Review>>> {
    let reviews = ReviewRepository::new(state.pool())
        .list_for_item(item_id)
        .await?;
    Ok(ApiResponse::ok(reviews))
}

/// Review an item.
///
/// # Route
///
/// `POST /api/review/{itemId}`
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiPath(item_id): ApiPath<ItemId>,
    ApiJson(request): ApiJson<ReviewRequest>,
) -> Result<ApiResponse<Review>> {
    validate(&request)?;
    let review = ReviewRepository::new(state.pool())
        .create(
            item_id,
            principal.user_id,
            request.content.trim(),
            request.score,
        )
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => {
                AppError::NotFound(format!("Item {item_id} not found"))
            }
            other => other.into(),
        })?;
    Ok(ApiResponse::ok_with_message(review, "Review added"))
}

/// Edit a review. Only its author may edit.
///
/// # Route
///
/// `PUT /api/review/{reviewId}`
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiPath(id): ApiPath<ReviewId>,
    ApiJson(request): ApiJson<ReviewRequest>,
) -> Result<ApiResponse<Review>> {
    validate(&request)?;
    let reviews = ReviewRepository::new(state.pool());

    if existing(&reviews, id).await?.user_id != principal.user_id {
        return Err(AppError::Forbidden(
            "Only the author can edit this review".to_string(),
        ));
    }

    let review = reviews
        .update(id, request.content.trim(), request.score)
        .await?;
    Ok(ApiResponse::ok_with_message(review, "Review updated"))
}

/// Delete a review. Author or administrator.
///
/// # Route
///
/// `DELETE /api/review/{reviewId}`
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiPath(id): ApiPath<ReviewId>,
) -> Result<ApiResponse<()>> {
    let reviews = ReviewRepository::new(state.pool());

    if !principal.owns_or_admin(existing(&reviews, id).await?.user_id) {
        return Err(AppError::Forbidden(
            "Not allowed to delete this review".to_string(),
        ));
    }

    reviews.delete(id).await?;
    Ok(ApiResponse::message("Review deleted"))
}
