//! 订单上传与查询

use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};

use crate::auth::AuthUser;
use crate::error::{LoyaltyError, Result};
use crate::service::SubmitOutcome;
use crate::state::AppState;

/// 请求体必须是 text/plain（允许携带 charset 等参数）
fn is_plain_text(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("text/plain"))
}

/// POST /api/user/orders
///
/// 200 已由当前用户上传；202 新订单已受理
pub async fn submit_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode> {
    if !is_plain_text(&headers) {
        return Err(LoyaltyError::BadRequest(
            "Content-Type 必须为 text/plain".to_string(),
        ));
    }

    match state
        .order_service
        .submit(body.trim(), user.user_id)
        .await?
    {
        SubmitOutcome::Accepted => Ok(StatusCode::ACCEPTED),
        SubmitOutcome::AlreadyOwnedByCaller => Ok(StatusCode::OK),
    }
}

/// GET /api/user/orders
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Response> {
    let orders = state.order_service.list_orders(user.user_id).await?;
    if orders.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(orders).into_response())
}
