//! Board comment route handlers.

use axum::extract::State;
use modish_core::{BoardId, CommentId};

use crate::db::boards::BoardRepository;
use crate::db::comments::CommentRepository;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::comment::{Comment, CommentRequest};
use crate::response::ApiResponse;
use crate::routes::board::readable_post;
use crate::state::AppState;

fn comment_body(request: &CommentRequest) -> Result<&str> {
    request
        .body()
        .ok_or_else(|| AppError::BadRequest("co_comment is required".to_string()))
}

/// Live comment or 404.
async fn live_comment(comments: &CommentRepository<'_>, id: CommentId) -> Result<Comment> {
    comments
        .get(id)
        .await?
        .filter(|c| !c.is_deleted)
        .ok_or_else(|| AppError::NotFound(format!("Comment {id} not found")))
}

/// Live comments on a post, oldest first. The post must be live and
/// readable by the caller.
///
/// # Route
///
/// `GET /api/comments/board/{boardNo}`
pub async fn list(
    State(state): State<AppState>,
    OptionalAuth(principal): OptionalAuth,
    ApiPath(board_id): ApiPath<BoardId>,
) -> Result<ApiResponse<Vec<Comment>>> {
    readable_post(&BoardRepository::new(state.pool()), principal.as_ref(), board_id).await?;

    let comments = CommentRepository::new(state.pool())
        .list_for_board(board_id)
        .await?;
    Ok(ApiResponse::ok(comments))
}

/// Comment on a live post.
///
/// # Route
///
/// `POST /api/comments/board/{boardNo}`
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiPath(board_id): ApiPath<BoardId>,
    ApiJson(request): ApiJson<CommentRequest>,
) -> Result<ApiResponse<Comment>> {
    let body = comment_body(&request)?;
    let comment = CommentRepository::new(state.pool())
        .create(board_id, principal.user_id, body)
        .await?;
    Ok(ApiResponse::ok_with_message(comment, "Comment added"))
}

/// Edit a comment. Only the writer may edit.
///
/// # Route
///
/// `PUT /api/comments/{coNo}`
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiPath(id): ApiPath<CommentId>,
    ApiJson(request): ApiJson<CommentRequest>,
) -> Result<ApiResponse<Comment>> {
    let body = comment_body(&request)?;
    let comments = CommentRepository::new(state.pool());

    let existing = live_comment(&comments, id).await?;
    if existing.writer_id != principal.user_id {
        return Err(AppError::Forbidden(
            "Only the writer can edit this comment".to_string(),
        ));
    }

    let comment = comments.update(id, body).await?;
    Ok(ApiResponse::ok_with_message(comment, "Comment updated"))
}

/// Soft-delete a comment. Writer or administrator.
///
/// # Route
///
/// `DELETE /api/comments/{coNo}`
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiPath(id): ApiPath<CommentId>,
) -> Result<ApiResponse<()>> {
    let comments = CommentRepository::new(state.pool());

    let existing = live_comment(&comments, id).await?;
    if !principal.owns_or_admin(existing.writer_id) {
        return Err(AppError::Forbidden(
            "Not allowed to delete this comment".to_string(),
        ));
    }

    comments.soft_delete(id).await?;
    Ok(ApiResponse::message("Comment deleted"))
}
