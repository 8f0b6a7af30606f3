//! Mock 积分查询服务
//!
//! 与真实积分系统相同的 REST 接口，使用 Axum 实现。

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::{info, warn};

use crate::rate_limit::{Admission, FixedWindowLimiter};
use crate::store::{AccrualRecord, AccrualStore};

/// 服务状态
#[derive(Clone)]
pub struct AccrualServiceState {
    pub store: AccrualStore,
    pub limiter: Arc<FixedWindowLimiter>,
    /// 未登记订单自动登记，并在每次查询后推进一步状态
    pub auto_progress: bool,
}

impl AccrualServiceState {
    pub fn new(limiter: FixedWindowLimiter, auto_progress: bool) -> Self {
        Self {
            store: AccrualStore::new(),
            limiter: Arc::new(limiter),
            auto_progress,
        }
    }
}

/// 构建积分服务路由
pub fn accrual_routes() -> Router<Arc<AccrualServiceState>> {
    Router::new()
        .route("/api/orders/{number}", get(get_order_accrual))
        .route("/api/orders", post(register_order))
}

/// GET /api/orders/{number}
async fn get_order_accrual(
    State(state): State<Arc<AccrualServiceState>>,
    Path(number): Path<String>,
) -> Response {
    if let Admission::Limited { retry_after } = state.limiter.check() {
        // 不足一秒按一秒算
        let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
        let secs = secs.max(1);
        warn!(order_number = %number, retry_after_secs = secs, "请求过多，触发限流");

        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            format!(
                "No more than {} requests per {} seconds allowed",
                state.limiter.max_requests(),
                state.limiter.window().as_secs()
            ),
        )
            .into_response();
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(secs));
        return response;
    }

    let record = if state.auto_progress {
        Some(state.store.observe_and_advance(&number))
    } else {
        state.store.get(&number)
    };

    match record {
        Some(record) => {
            info!(order_number = %number, status = ?record.status, "返回积分计算结果");
            Json(record).into_response()
        }
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// POST /api/orders
///
/// 登记订单的计算结果；已登记的订单返回 409，终态结果可重复覆盖以便测试
async fn register_order(
    State(state): State<Arc<AccrualServiceState>>,
    Json(record): Json<AccrualRecord>,
) -> StatusCode {
    if record.order.is_empty() || !record.order.chars().all(|c| c.is_ascii_digit()) {
        return StatusCode::BAD_REQUEST;
    }

    if record.status.is_final() {
        info!(order_number = %record.order, status = ?record.status, "写入订单终态结果");
        state.store.upsert(record);
        return StatusCode::ACCEPTED;
    }

    if state.store.register(record) {
        StatusCode::ACCEPTED
    } else {
        StatusCode::CONFLICT
    }
}
