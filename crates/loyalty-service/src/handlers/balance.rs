//! 余额、提现与提现记录

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::auth::AuthUser;
use crate::error::{LoyaltyError, Result};
use crate::models::Balance;
use crate::service::dto::WithdrawRequest;
use crate::state::AppState;

/// GET /api/user/balance
pub async fn get_balance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Balance>> {
    let balance = state.ledger_service.balance(user.user_id).await?;
    Ok(Json(balance))
}

/// POST /api/user/balance/withdraw
pub async fn withdraw(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<WithdrawRequest>, JsonRejection>,
) -> Result<StatusCode> {
    let Json(request) = payload.map_err(|e| LoyaltyError::BadRequest(e.body_text()))?;
    state
        .withdrawal_service
        .withdraw(user.user_id, &request.order, request.sum)
        .await?;
    Ok(StatusCode::OK)
}

/// GET /api/user/withdrawals
pub async fn list_withdrawals(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Response> {
    let withdrawals = state
        .withdrawal_service
        .list_withdrawals(user.user_id)
        .await?;
    if withdrawals.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(withdrawals).into_response())
}
