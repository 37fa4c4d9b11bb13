//! Payment gateway proxy route handlers.

use axum::extract::State;

use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::middleware::RequireAuth;
use crate::response::ApiResponse;
use crate::services::payment::{CancelRequest, CanceledPayment, ConfirmRequest, ConfirmedPayment};
use crate::state::AppState;

fn required(value: Option<&str>, name: &str) -> Result<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| AppError::BadRequest(format!("{name} is required")))
}

/// Confirm an authorised payment with the gateway.
///
/// # Route
///
/// `POST /api/payment/confirm`
pub async fn confirm(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiJson(request): ApiJson<ConfirmRequest>,
) -> Result<ApiResponse<ConfirmedPayment>> {
    let payment_key = required(request.payment_key.as_deref(), "paymentKey")?;
    let order_id = required(request.order_id.as_deref(), "orderId")?;
    let amount = request
        .amount
        .filter(|a| *a > 0)
        .ok_or_else(|| AppError::BadRequest("amount must be positive".to_string()))?;

    let confirmed = state
        .payment()
        .confirm(&payment_key, &order_id, amount)
        .await
        .inspect_err(|e| {
            tracing::warn!(
                user_id = %principal.user_id,
                %order_id,
                error = %e,
                "Payment confirmation failed"
            );
        })?;
    Ok(ApiResponse::ok(confirmed))
}

/// Cancel a confirmed payment.
///
/// # Route
///
/// `POST /api/payment/cancel`
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiJson(request): ApiJson<CancelRequest>,
) -> Result<ApiResponse<CanceledPayment>> {
    let payment_key = required(request.payment_key.as_deref(), "paymentKey")?;

    let canceled = state
        .payment()
        .cancel(&payment_key, request.cancel_reason.as_deref())
        .await
        .inspect_err(|e| {
            tracing::warn!(user_id = %principal.user_id, error = %e, "Payment cancellation failed");
        })?;
    Ok(ApiResponse::ok(canceled))
}
