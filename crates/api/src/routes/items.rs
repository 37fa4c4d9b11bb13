//! Catalog route handlers.
//!
//! The three listings share one filter builder; favorites and cart listings
//! add the caller as the owner of the joined relation.

use axum::extract::{RawQuery, State};
use modish_core::{ItemId, UserId};
use sqlx::PgPool;

use crate::db::catalog::{CatalogFilter, CatalogRepository, CatalogScope};
use crate::db::items::ItemRepository;
use crate::error::{AppError, Result};
use crate::extract::ApiPath;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::item::{ItemDetail, ItemSummary};
use crate::response::{ApiResponse, Page};
use crate::state::AppState;

// =============================================================================
// Shared Loaders
// =============================================================================

/// Run a filtered catalog search from a raw query string.
pub(crate) async fn search_page(
    pool: &PgPool,
    scope: CatalogScope,
    raw_query: Option<&str>,
    viewer: Option<UserId>,
) -> Result<Page<ItemSummary>> {
    let (filter, page) = CatalogFilter::from_query(raw_query.unwrap_or_default())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let (rows, total) = CatalogRepository::new(pool)
        .search(scope, &filter, viewer, page)
        .await?;

    Ok(Page::new(
        rows.into_iter().map(ItemSummary::from).collect(),
        page.page(),
        page.size(),
        total,
    ))
}

/// Load an item with its images, variants and statistics.
pub(crate) async fn load_detail(
    pool: &PgPool,
    id: ItemId,
    viewer: Option<UserId>,
) -> Result<ItemDetail> {
    let items = ItemRepository::new(pool);
    let item = items
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Item {id} not found")))?;

    let images = items.images(id).await?;
    let colors = items.colors(id).await?;
    let sizes = items.sizes(id).await?;
    let stats = items.stats(id, viewer).await?;

    Ok(ItemDetail::new(item, images, colors, sizes, stats))
}

// =============================================================================
// Listings
// =============================================================================

/// All items matching the filters.
///
/// # Route
///
/// `GET /api/item`
pub async fn list(
    State(state): State<AppState>,
    OptionalAuth(principal): OptionalAuth,
    RawQuery(query): RawQuery,
) -> Result<ApiResponse<Page<ItemSummary>>> {
    let viewer = principal.map(|p| p.user_id);
    let page = search_page(state.pool(), CatalogScope::All, query.as_deref(), viewer).await?;
    Ok(ApiResponse::ok(page))
}

/// The caller's favorites matching the filters.
///
/// # Route
///
/// `GET /api/item/favorite`
pub async fn favorites(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    RawQuery(query): RawQuery,
) -> Result<ApiResponse<Page<ItemSummary>>> {
    let user_id = principal.user_id;
    let page = search_page(
        state.pool(),
        CatalogScope::Favorites(user_id),
        query.as_deref(),
        Some(user_id),
    )
    .await?;
    Ok(ApiResponse::ok(page))
}

/// The caller's cart items matching the filters.
///
/// # Route
///
/// `GET /api/item/cart`
pub async fn cart(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    RawQuery(query): RawQuery,
) -> Result<ApiResponse<Page<ItemSummary>>> {
    let user_id = principal.user_id;
    let page = search_page(
        state.pool(),
        CatalogScope::Cart(user_id),
        query.as_deref(),
        Some(user_id),
    )
    .await?;
    Ok(ApiResponse::ok(page))
}

// =============================================================================
// Detail
// =============================================================================

/// One item with images, variants and statistics.
///
/// # Route
///
/// `GET /api/item/{id}`
pub async fn detail(
    State(state): State<AppState>,
    OptionalAuth(principal): OptionalAuth,
    ApiPath(id): ApiPath<ItemId>,
) -> Result<ApiResponse<ItemDetail>> {
    let detail = load_detail(state.pool(), id, principal.map(|p| p.user_id)).await?;
    Ok(ApiResponse::ok(detail))
}

// =============================================================================
// Toggles
// =============================================================================

/// Toggle the item in the caller's favorites. `data` is the new state.
///
/// # Route
///
/// `POST /api/item/favorite/{id}`
pub async fn toggle_favorite(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiPath(id): ApiPath<ItemId>,
) -> Result<ApiResponse<bool>> {
    let favorited = ItemRepository::new(state.pool())
        .toggle_favorite(principal.user_id, id)
        .await?;
    let message = if favorited {
        "Added to favorites"
    } else {
        "Removed from favorites"
    };
    Ok(ApiResponse::ok_with_message(favorited, message))
}

/// Toggle the item in the caller's cart. `data` is the new state.
///
/// # Route
///
/// `POST /api/item/cart/{id}`
pub async fn toggle_cart(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiPath(id): ApiPath<ItemId>,
) -> Result<ApiResponse<bool>> {
    let in_cart = ItemRepository::new(state.pool())
        .toggle_cart(principal.user_id, id)
        .await?;
    let message = if in_cart {
        "Added to cart"
    } else {
        "Removed from cart"
    };
    Ok(ApiResponse::ok_with_message(in_cart, message))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::test_support::test_state;

    #[tokio::test]
    async fn test_unknown_color_is_bad_request() {
        let app = Router::new()
            .nest("/api/item", crate::routes::item_routes())
            .with_state(test_state());

        let response = app
            .oneshot(
                Request::get("/api/item?colors=RED,TEAL")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_non_numeric_item_id_is_bad_request() {
        let app = Router::new()
            .nest("/api/item", crate::routes::item_routes())
            .with_state(test_state());

        let response = app
            .oneshot(Request::get("/api/item/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
