//! Discussion board route handlers.
//!
//! Posts are soft-deleted; deleted posts and their attachments answer 404.
//! Secret posts are readable only by their writer and administrators.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use modish_core::{BoardFileId, BoardId, UserId};

use crate::db::boards::BoardRepository;
use crate::error::{AppError, Result};
use crate::extract::{ApiPath, ApiQuery};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::board::{
    BOARD_PAGE_SIZE, BoardFile, BoardListQuery, BoardPage, BoardPost, PostInput, parse_yn,
};
use crate::response::{ApiResponse, total_pages};
use crate::routes::form::MultipartForm;
use crate::services::auth::Principal;
use crate::services::uploads::{
    StoredFile, UploadError, UploadStore, UploadedFile, is_image_extension,
};
use crate::state::AppState;

const IMAGE_CACHE_CONTROL: &str = "max-age=86400";
const FILES_PART: &str = "uploadFiles";

// =============================================================================
// Helpers
// =============================================================================

/// Post fields from the multipart form.
fn post_input(form: &MultipartForm) -> Result<PostInput> {
    let field = |name: &'static str| -> Result<String> {
        form.text(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| AppError::BadRequest(format!("{name} is required")))
    };

    Ok(PostInput {
        category: field("boardCategory")?,
        title: field("title")?,
        content: field("content")?,
        is_secret: form.text("secretYn").is_some_and(parse_yn),
    })
}

/// Store every attachment, removing the ones already written if any fails.
async fn store_files(uploads: &UploadStore, files: &[UploadedFile]) -> Result<Vec<StoredFile>> {
    let mut stored = Vec::with_capacity(files.len());
    for file in files {
        match uploads.save_board_file(file).await {
            Ok(saved) => stored.push(saved),
            Err(e) => {
                discard(uploads, &stored).await;
                return Err(e.into());
            }
        }
    }
    Ok(stored)
}

async fn discard(uploads: &UploadStore, files: &[StoredFile]) {
    for file in files {
        uploads.remove_board_file(&file.save_filename).await;
    }
}

/// A live post with its attachments, or 404.
async fn live_post(boards: &BoardRepository<'_>, id: BoardId) -> Result<BoardPost> {
    let mut post = boards
        .get(id)
        .await?
        .filter(|p| !p.is_deleted)
        .ok_or_else(|| AppError::NotFound(format!("Post {id} not found")))?;
    post.files = boards.files(id).await?;
    Ok(post)
}

fn reader(principal: Option<&Principal>) -> Option<(UserId, bool)> {
    principal.map(|p| (p.user_id, p.is_admin()))
}

/// 401 for anonymous and 403 for other callers when the post is secret.
fn check_readable(post: &BoardPost, principal: Option<&Principal>) -> Result<()> {
    if post.readable_by(reader(principal)) {
        return Ok(());
    }
    Err(match principal {
        None => AppError::Unauthorized("Authentication required".to_string()),
        Some(_) => AppError::Forbidden("This post is private".to_string()),
    })
}

/// A live post the caller may read, with its attachments.
pub(crate) async fn readable_post(
    boards: &BoardRepository<'_>,
    principal: Option<&Principal>,
    id: BoardId,
) -> Result<BoardPost> {
    let post = live_post(boards, id).await?;
    check_readable(&post, principal)?;
    Ok(post)
}

/// Bytes of a stored attachment of a live post.
async fn read_live_file(state: &AppState, id: BoardFileId) -> Result<(BoardFile, Vec<u8>)> {
    let file = BoardRepository::new(state.pool())
        .get_live_file(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("File {id} not found")))?;

    let path = state.uploads().board_file_path(&file.save_filename)?;
    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            tracing::warn!(file_id = %id, path = %path.display(), "Attachment missing on disk");
            AppError::from(UploadError::NotFound)
        } else {
            AppError::from(UploadError::Io(e))
        }
    })?;

    Ok((file, bytes))
}

/// `Content-Disposition` for a download, with the original name RFC 5987 encoded.
fn attachment_disposition(origin_filename: &str) -> String {
    format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(origin_filename)
    )
}

fn image_content_type(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

fn file_response(
    bytes: Vec<u8>,
    content_type: &str,
    extra: &[(header::HeaderName, String)],
) -> Result<Response> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, bytes.len());
    for (name, value) in extra {
        let value = HeaderValue::from_str(value)
            .map_err(|e| AppError::Internal(format!("invalid header value: {e}")))?;
        builder = builder.header(name, value);
    }
    builder
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(format!("failed to build response: {e}")))
}

// =============================================================================
// Posts
// =============================================================================

/// A page of live posts, newest first.
///
/// # Route
///
/// `GET /api/board/list?page=&category=&keyword=`
pub async fn list(
    State(state): State<AppState>,
    OptionalAuth(principal): OptionalAuth,
    ApiQuery(query): ApiQuery<BoardListQuery>,
) -> Result<ApiResponse<BoardPage>> {
    let page = query.page();
    let (posts, total) = BoardRepository::new(state.pool())
        .list(query.category(), query.keyword(), page)
        .await?;

    let viewer = reader(principal.as_ref());
    let list = posts
        .into_iter()
        .map(|post| {
            if post.readable_by(viewer) {
                post
            } else {
                post.masked()
            }
        })
        .collect();

    Ok(ApiResponse::ok(BoardPage {
        list,
        total_pages: total_pages(total, BOARD_PAGE_SIZE),
        total_elements: total,
        current_page: page,
    }))
}

/// Create a post with optional attachments.
///
/// # Route
///
/// `POST /api/board/write` (multipart)
pub async fn write(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    mut form: MultipartForm,
) -> Result<ApiResponse<BoardPost>> {
    let input = post_input(&form)?;
    let uploads = state.uploads();
    let stored = store_files(uploads, &form.take_files(FILES_PART)).await?;

    let boards = BoardRepository::new(state.pool());
    let id = match boards.create(principal.user_id, &input, &stored).await {
        Ok(id) => id,
        Err(e) => {
            discard(uploads, &stored).await;
            return Err(e.into());
        }
    };

    tracing::info!(board_id = %id, files = stored.len(), "Post created");
    let post = live_post(&boards, id).await?;
    Ok(ApiResponse::ok_with_message(post, "Post created"))
}

/// One post with its attachments. Counts a view.
///
/// # Route
///
/// `GET /api/board/{no}`
pub async fn detail(
    State(state): State<AppState>,
    OptionalAuth(principal): OptionalAuth,
    ApiPath(id): ApiPath<BoardId>,
) -> Result<ApiResponse<BoardPost>> {
    let boards = BoardRepository::new(state.pool());
    let mut post = readable_post(&boards, principal.as_ref(), id).await?;
    boards.increment_views(id).await?;
    post.views += 1;
    Ok(ApiResponse::ok(post))
}

/// Edit a post and append attachments. Only the writer may edit.
///
/// # Route
///
/// `PUT /api/board/{no}` (multipart)
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiPath(id): ApiPath<BoardId>,
    mut form: MultipartForm,
) -> Result<ApiResponse<BoardPost>> {
    let boards = BoardRepository::new(state.pool());
    let existing = live_post(&boards, id).await?;
    if existing.writer_id != principal.user_id {
        return Err(AppError::Forbidden("Only the writer can edit this post".to_string()));
    }

    let input = post_input(&form)?;
    let uploads = state.uploads();
    let stored = store_files(uploads, &form.take_files(FILES_PART)).await?;

    if let Err(e) = boards.update(id, &input, &stored).await {
        discard(uploads, &stored).await;
        return Err(e.into());
    }

    let post = live_post(&boards, id).await?;
    Ok(ApiResponse::ok_with_message(post, "Post updated"))
}

/// Soft-delete a post. Writer or administrator.
///
/// # Route
///
/// `DELETE /api/board/{no}`
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiPath(id): ApiPath<BoardId>,
) -> Result<ApiResponse<()>> {
    let boards = BoardRepository::new(state.pool());
    let post = boards
        .get(id)
        .await?
        .filter(|p| !p.is_deleted)
        .ok_or_else(|| AppError::NotFound(format!("Post {id} not found")))?;

    if !principal.owns_or_admin(post.writer_id) {
        return Err(AppError::Forbidden("Not allowed to delete this post".to_string()));
    }

    boards.soft_delete(id).await?;
    tracing::info!(board_id = %id, by = %principal.user_id, "Post deleted");
    Ok(ApiResponse::message("Post deleted"))
}

// =============================================================================
// Attachments
// =============================================================================

/// Download an attachment.
///
/// # Route
///
/// `GET /api/board/file/{fileNo}`
pub async fn download(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<BoardFileId>,
) -> Result<Response> {
    let (file, bytes) = read_live_file(&state, id).await?;
    file_response(
        bytes,
        "application/octet-stream",
        &[(
            header::CONTENT_DISPOSITION,
            attachment_disposition(&file.origin_filename),
        )],
    )
}

/// Show an image attachment inline.
///
/// # Route
///
/// `GET /api/board/image/{fileNo}`
pub async fn image(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<BoardFileId>,
) -> Result<Response> {
    let (file, bytes) = read_live_file(&state, id).await?;
    if !is_image_extension(&file.file_ext) {
        return Err(AppError::BadRequest("Attachment is not an image".to_string()));
    }

    file_response(
        bytes,
        image_content_type(&file.file_ext),
        &[(header::CACHE_CONTROL, IMAGE_CACHE_CONTROL.to_string())],
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use modish_core::{Email, Role};

    use super::*;

    fn post(writer: i64, is_secret: bool) -> BoardPost {
        BoardPost {
            id: BoardId::new(1),
            writer_id: UserId::new(writer),
            writer_name: "writer".to_string(),
            category: "QNA".to_string(),
            title: "Sizing".to_string(),
            content: "Runs small?".to_string(),
            views: 0,
            is_secret,
            is_deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            comment_count: 0,
            files: Vec::new(),
        }
    }

    fn principal(id: i64, role: Role) -> Principal {
        Principal {
            user_id: UserId::new(id),
            email: Email::parse("reader@example.com").unwrap(),
            role,
        }
    }

    #[test]
    fn test_secret_post_readers() {
        let secret = post(7, true);

        assert!(matches!(
            check_readable(&secret, None),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            check_readable(&secret, Some(&principal(8, Role::User))),
            Err(AppError::Forbidden(_))
        ));
        assert!(check_readable(&secret, Some(&principal(7, Role::User))).is_ok());
        assert!(check_readable(&secret, Some(&principal(9, Role::Admin))).is_ok());
        assert!(check_readable(&post(7, false), None).is_ok());
    }

    #[test]
    fn test_attachment_disposition_encodes_name() {
        assert_eq!(
            attachment_disposition("size chart 2024.pdf"),
            "attachment; filename*=UTF-8''size%20chart%202024.pdf"
        );
        assert_eq!(
            attachment_disposition("사이즈.png"),
            "attachment; filename*=UTF-8''%EC%82%AC%EC%9D%B4%EC%A6%88.png"
        );
    }

    #[test]
    fn test_image_content_type() {
        assert_eq!(image_content_type("PNG"), "image/png");
        assert_eq!(image_content_type("jpeg"), "image/jpeg");
        assert_eq!(image_content_type("webp"), "image/webp");
    }

    #[test]
    fn test_file_response_headers() {
        let response = file_response(
            b"hello".to_vec(),
            "image/png",
            &[(header::CACHE_CONTROL, IMAGE_CACHE_CONTROL.to_string())],
        )
        .unwrap();

        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "5");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "max-age=86400");
    }
}
