//! Order route handlers.
//!
//! Checkout turns the caller's cart into an order in one transaction; the
//! listings only ever show the caller's own orders.

use axum::extract::State;
use modish_core::OrderId;

use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::RequireAuth;
use crate::models::order::{OrderDetail, OrderRequest, OrderSummary, PlacedOrder};
use crate::response::{ApiResponse, Page, PageRequest};
use crate::state::AppState;

/// Place an order from the caller's cart.
///
/// # Route
///
/// `POST /api/order`
pub async fn place(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiJson(request): ApiJson<OrderRequest>,
) -> Result<ApiResponse<PlacedOrder>> {
    if let Some(field) = request.missing_field() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }

    let placed = OrderRepository::new(state.pool())
        .place(principal.user_id, &request)
        .await?;
    Ok(ApiResponse::ok_with_message(placed, "Order placed"))
}

/// The caller's orders, newest first.
///
/// # Route
///
/// `GET /api/order?page=&size=`
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> Result<ApiResponse<Page<OrderSummary>>> {
    let (rows, total) = OrderRepository::new(state.pool())
        .list_for_user(principal.user_id, page)
        .await?;

    Ok(ApiResponse::ok(Page::new(
        rows.into_iter().map(OrderSummary::from).collect(),
        page.page(),
        page.size(),
        total,
    )))
}

/// One of the caller's orders with its lines.
///
/// # Route
///
/// `GET /api/order/{id}`
pub async fn detail(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<ApiResponse<OrderDetail>> {
    let orders = OrderRepository::new(state.pool());
    let order = orders
        .get_for_user(principal.user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {id} not found")))?;
    let lines = orders.lines(order.id).await?;

    Ok(ApiResponse::ok(OrderDetail::new(order, lines)))
}
