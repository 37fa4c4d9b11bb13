//! Home page banner route handlers.
//!
//! Reads are public; writes are gated to administrators by the access rules.
//! Replaced and deleted images are removed from disk best-effort.

use axum::extract::State;
use modish_core::BannerId;

use crate::db::banners::BannerRepository;
use crate::error::{AppError, Result};
use crate::extract::ApiPath;
use crate::middleware::RequireAdmin;
use crate::models::banner::{Banner, BannerForm, BannerInput};
use crate::response::ApiResponse;
use crate::routes::form::MultipartForm;
use crate::services::uploads::ImageDir;
use crate::state::AppState;

fn banner_input(form: &MultipartForm) -> Result<BannerInput> {
    form.json::<BannerForm>("data")?
        .validate()
        .map_err(|msg| AppError::BadRequest(msg.to_string()))
}

/// Active banners in display order.
///
/// # Route
///
/// `GET /api/banner`
pub async fn list_active(State(state): State<AppState>) -> Result<ApiResponse<Vec<Banner>>> {
    let banners = BannerRepository::new(state.pool()).list(true).await?;
    Ok(ApiResponse::ok(banners))
}

/// Every banner in display order.
///
/// # Route
///
/// `GET /api/banner/admin`
pub async fn list_all(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<ApiResponse<Vec<Banner>>> {
    let banners = BannerRepository::new(state.pool()).list(false).await?;
    Ok(ApiResponse::ok(banners))
}

/// One banner.
///
/// # Route
///
/// `GET /api/banner/{id}`
pub async fn detail(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<BannerId>,
) -> Result<ApiResponse<Banner>> {
    let banner = BannerRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Banner {id} not found")))?;
    Ok(ApiResponse::ok(banner))
}

/// Create a banner from a `data` JSON part and a required `image` part.
///
/// # Route
///
/// `POST /api/banner` (multipart)
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    mut form: MultipartForm,
) -> Result<ApiResponse<Banner>> {
    let input = banner_input(&form)?;
    let image = form
        .take_file("image")
        .ok_or_else(|| AppError::BadRequest("image is required".to_string()))?;

    let uploads = state.uploads();
    let image_url = uploads.save_image(ImageDir::Banner, &image).await?;

    match BannerRepository::new(state.pool())
        .create(&input, &image_url)
        .await
    {
        Ok(banner) => {
            tracing::info!(banner_id = %banner.id, "Banner created");
            Ok(ApiResponse::ok_with_message(banner, "Banner created"))
        }
        Err(e) => {
            uploads.remove_image(&image_url).await;
            Err(e.into())
        }
    }
}

/// Update a banner; an `image` part replaces the stored image.
///
/// # Route
///
/// `PUT /api/banner/{id}` (multipart)
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiPath(id): ApiPath<BannerId>,
    mut form: MultipartForm,
) -> Result<ApiResponse<Banner>> {
    let input = banner_input(&form)?;
    let banners = BannerRepository::new(state.pool());
    let existing = banners
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Banner {id} not found")))?;

    let uploads = state.uploads();
    let new_image = match form.take_file("image") {
        Some(image) => Some(uploads.save_image(ImageDir::Banner, &image).await?),
        None => None,
    };

    let banner = match banners.update(id, &input, new_image.as_deref()).await {
        Ok(banner) => banner,
        Err(e) => {
            if let Some(url) = &new_image {
                uploads.remove_image(url).await;
            }
            return Err(e.into());
        }
    };

    if new_image.is_some() {
        uploads.remove_image(&existing.image_url).await;
    }
    Ok(ApiResponse::ok_with_message(banner, "Banner updated"))
}

/// Delete a banner and its image.
///
/// # Route
///
/// `DELETE /api/banner/{id}`
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiPath(id): ApiPath<BannerId>,
) -> Result<ApiResponse<()>> {
    let banner = BannerRepository::new(state.pool()).delete(id).await?;
    state.uploads().remove_image(&banner.image_url).await;

    tracing::info!(banner_id = %id, "Banner deleted");
    Ok(ApiResponse::message("Banner deleted"))
}
