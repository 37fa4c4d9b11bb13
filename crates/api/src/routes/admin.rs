//! Admin item management route handlers.
//!
//! Every route here is gated to `ADMIN` by the access rules and re-checked by
//! the [`RequireAdmin`] extractor. Item images live under the public
//! `/product` directory; files replaced or orphaned by a write are removed
//! best-effort after the transaction commits.

use axum::extract::{RawQuery, State};
use modish_core::ItemId;

use crate::db::catalog::CatalogScope;
use crate::db::items::ItemRepository;
use crate::error::{AppError, Result};
use crate::extract::ApiPath;
use crate::middleware::RequireAdmin;
use crate::models::item::{ItemDetail, ItemForm, ItemInput, ItemSummary};
use crate::response::{ApiResponse, Page};
use crate::routes::form::MultipartForm;
use crate::routes::items::{load_detail, search_page};
use crate::services::uploads::{ImageDir, UploadStore, UploadedFile};
use crate::state::AppState;

const DATA_PART: &str = "data";
const MAIN_IMAGE_PART: &str = "mainImage";
const IMAGES_PART: &str = "images";

// =============================================================================
// Helpers
// =============================================================================

fn item_input(form: &MultipartForm) -> Result<ItemInput> {
    form.json::<ItemForm>(DATA_PART)?
        .validate(chrono::Utc::now().timestamp_millis())
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Store product images, removing the ones already written if any fails.
async fn save_images(uploads: &UploadStore, files: &[UploadedFile]) -> Result<Vec<String>> {
    let mut urls = Vec::with_capacity(files.len());
    for file in files {
        match uploads.save_image(ImageDir::Product, file).await {
            Ok(url) => urls.push(url),
            Err(e) => {
                remove_images(uploads, &urls).await;
                return Err(e.into());
            }
        }
    }
    Ok(urls)
}

async fn remove_images(uploads: &UploadStore, urls: &[String]) {
    for url in urls {
        uploads.remove_image(url).await;
    }
}

/// Images received in one request: the optional main image and the list.
struct ReceivedImages {
    main: Option<String>,
    list: Option<Vec<String>>,
}

impl ReceivedImages {
    async fn save(uploads: &UploadStore, form: &mut MultipartForm) -> Result<Self> {
        let main = match form.take_file(MAIN_IMAGE_PART) {
            Some(file) => Some(uploads.save_image(ImageDir::Product, &file).await?),
            None => None,
        };

        let files = form.take_files(IMAGES_PART);
        let list = if files.is_empty() {
            None
        } else {
            match save_images(uploads, &files).await {
                Ok(urls) => Some(urls),
                Err(e) => {
                    remove_images(uploads, main.as_slice()).await;
                    return Err(e);
                }
            }
        };

        Ok(Self { main, list })
    }

    fn urls(&self) -> Vec<String> {
        self.main
            .iter()
            .chain(self.list.iter().flatten())
            .cloned()
            .collect()
    }
}

// =============================================================================
// Reads
// =============================================================================

/// Catalog listing for the admin UI.
///
/// # Route
///
/// `GET /api/admin/item`
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(principal): RequireAdmin,
    RawQuery(query): RawQuery,
) -> Result<ApiResponse<Page<ItemSummary>>> {
    let page = search_page(
        state.pool(),
        CatalogScope::All,
        query.as_deref(),
        Some(principal.user_id),
    )
    .await?;
    Ok(ApiResponse::ok(page))
}

/// Item detail for the admin UI.
///
/// # Route
///
/// `GET /api/admin/item/{itemId}`
pub async fn detail(
    State(state): State<AppState>,
    RequireAdmin(principal): RequireAdmin,
    ApiPath(id): ApiPath<ItemId>,
) -> Result<ApiResponse<ItemDetail>> {
    let detail = load_detail(state.pool(), id, Some(principal.user_id)).await?;
    Ok(ApiResponse::ok(detail))
}

// =============================================================================
// Writes
// =============================================================================

/// Create an item.
///
/// # Route
///
/// `POST /api/admin/item` (multipart: `data`, `mainImage?`, `images*`)
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(principal): RequireAdmin,
    mut form: MultipartForm,
) -> Result<ApiResponse<ItemDetail>> {
    let input = item_input(&form)?;
    let uploads = state.uploads();
    let images = ReceivedImages::save(uploads, &mut form).await?;

    let created = ItemRepository::new(state.pool())
        .create(
            &input,
            images.main.as_deref(),
            images.list.as_deref().unwrap_or_default(),
        )
        .await;
    let id = match created {
        Ok(id) => id,
        Err(e) => {
            remove_images(uploads, &images.urls()).await;
            return Err(e.into());
        }
    };

    let detail = load_detail(state.pool(), id, Some(principal.user_id)).await?;
    Ok(ApiResponse::ok_with_message(detail, "Item created"))
}

/// Update an item. Variants are replaced; provided images replace the
/// stored ones.
///
/// # Route
///
/// `PUT /api/admin/item/{itemId}` (multipart)
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(principal): RequireAdmin,
    ApiPath(id): ApiPath<ItemId>,
    mut form: MultipartForm,
) -> Result<ApiResponse<ItemDetail>> {
    let input = item_input(&form)?;
    let uploads = state.uploads();
    let images = ReceivedImages::save(uploads, &mut form).await?;

    let updated = ItemRepository::new(state.pool())
        .update(id, &input, images.main.as_deref(), images.list.as_deref())
        .await;
    let released = match updated {
        Ok(released) => released,
        Err(e) => {
            remove_images(uploads, &images.urls()).await;
            return Err(e.into());
        }
    };
    remove_images(uploads, &released.urls).await;

    let detail = load_detail(state.pool(), id, Some(principal.user_id)).await?;
    Ok(ApiResponse::ok_with_message(detail, "Item updated"))
}

/// Delete an item. Order lines keep their snapshot.
///
/// # Route
///
/// `DELETE /api/admin/item/{itemId}`
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(principal): RequireAdmin,
    ApiPath(id): ApiPath<ItemId>,
) -> Result<ApiResponse<()>> {
    let released = ItemRepository::new(state.pool()).delete(id).await?;
    remove_images(state.uploads(), &released.urls).await;

    tracing::info!(item_id = %id, by = %principal.user_id, "Item deleted");
    Ok(ApiResponse::message("Item deleted"))
}
