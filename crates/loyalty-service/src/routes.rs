//! 路由配置模块

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{handlers, middleware::auth_middleware, state::AppState};

/// 注册与登录（公开路由）
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::user::register))
        .route("/login", post(handlers::user::login))
}

/// 订单与余额路由，需要 Bearer Token
fn account_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/orders",
            post(handlers::order::submit_order).get(handlers::order::list_orders),
        )
        .route("/balance", get(handlers::balance::get_balance))
        .route("/balance/withdraw", post(handlers::balance::withdraw))
        .route("/withdrawals", get(handlers::balance::list_withdrawals))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// /api/user 下的全部路由
pub fn api_routes(state: AppState) -> Router<AppState> {
    auth_routes().merge(account_routes(state))
}

/// 组装带状态的应用路由
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api/user", api_routes(state.clone()))
        .with_state(state)
}
