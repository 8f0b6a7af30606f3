//! 注册与登录

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};

use crate::error::{LoyaltyError, Result};
use crate::service::dto::CredentialsRequest;
use crate::state::AppState;

fn token_response(token: String) -> Response {
    (StatusCode::OK, [(AUTHORIZATION, format!("Bearer {}", token))]).into_response()
}

/// POST /api/user/register
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload.map_err(|e| LoyaltyError::BadRequest(e.body_text()))?;
    let token = state.user_service.register(&request).await?;
    Ok(token_response(token))
}

/// POST /api/user/login
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload.map_err(|e| LoyaltyError::BadRequest(e.body_text()))?;
    let token = state.user_service.login(&request).await?;
    Ok(token_response(token))
}
