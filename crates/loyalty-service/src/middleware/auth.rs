//! JWT 认证中间件
//!
//! 验证 Bearer Token，并将调用方 `AuthUser` 注入请求扩展

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::LoyaltyError;
use crate::state::AppState;

/// 认证中间件
///
/// 仅挂载在需要登录的路由上，注册和登录不经过此中间件
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let Some(token) = token else {
        return LoyaltyError::Unauthorized("缺少认证 Token".to_string()).into_response();
    };

    match state.jwt_manager.verify_token(token) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
