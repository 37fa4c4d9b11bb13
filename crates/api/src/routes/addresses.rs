//! Shipping address route handlers.
//!
//! Ownership and the single-default rule are enforced by the repository
//! inside each write transaction.

use axum::extract::State;
use modish_core::AddressId;

use crate::db::addresses::AddressRepository;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::models::address::{Address, AddressRequest};
use crate::response::ApiResponse;
use crate::state::AppState;

fn validate(request: &AddressRequest) -> Result<()> {
    match request.missing_field() {
        Some(field) => Err(AppError::BadRequest(format!("{field} is required"))),
        None => Ok(()),
    }
}

/// The caller's addresses, default first.
///
/// # Route
///
/// `GET /api/address`
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
) -> Result<ApiResponse<Vec<Address>>> {
    let addresses = AddressRepository::new(state.pool())
        .list_for_user(principal.user_id)
        .await?;
    Ok(ApiResponse::ok(addresses))
}

/// Add an address.
///
/// # Route
///
/// `POST /api/address`
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiJson(request): ApiJson<AddressRequest>,
) -> Result<ApiResponse<Address>> {
    validate(&request)?;
    let address = AddressRepository::new(state.pool())
        .create(principal.user_id, &request)
        .await?;
    Ok(ApiResponse::ok_with_message(address, "Address added"))
}

/// Replace one of the caller's addresses.
///
/// # Route
///
/// `PUT /api/address/{id}`
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiPath(id): ApiPath<AddressId>,
    ApiJson(request): ApiJson<AddressRequest>,
) -> Result<ApiResponse<Address>> {
    validate(&request)?;
    let address = AddressRepository::new(state.pool())
        .update(principal.user_id, id, &request)
        .await?;
    Ok(ApiResponse::ok_with_message(address, "Address updated"))
}

/// Delete one of the caller's addresses.
///
/// # Route
///
/// `DELETE /api/address/{id}`
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiPath(id): ApiPath<AddressId>,
) -> Result<ApiResponse<()>> {
    AddressRepository::new(state.pool())
        .delete(principal.user_id, id)
        .await?;
    Ok(ApiResponse::message("Address deleted"))
}

/// Make one of the caller's addresses the default.
///
/// # Route
///
/// `PUT /api/address/{id}/default`
pub async fn set_default(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiPath(id): ApiPath<AddressId>,
) -> Result<ApiResponse<()>> {
    AddressRepository::new(state.pool())
        .set_default(principal.user_id, id)
        .await?;
    Ok(ApiResponse::message("Default address changed"))
}
