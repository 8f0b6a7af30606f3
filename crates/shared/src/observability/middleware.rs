//! HTTP 中间件：请求 ID 与请求级 span/指标
//!
//! `request_id` 需要包在 `http_tracing` 外层，span 才能带上请求 ID。

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, info_span};

use super::metrics;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// 客户端传入的请求 ID 超过该长度时丢弃，改用服务端生成的 ID
const MAX_REQUEST_ID_LEN: usize = 128;

/// 请求 ID，由 [`request_id`] 写入请求扩展
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 沿用客户端的 ID（需为可见 ASCII 且长度合理），否则生成新的 UUID
    fn accept_or_generate(incoming: Option<&HeaderValue>) -> Self {
        incoming
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|id| {
                !id.is_empty()
                    && id.len() <= MAX_REQUEST_ID_LEN
                    && id.bytes().all(|b| b.is_ascii_graphic())
            })
            .map(|id| Self(id.to_string()))
            .unwrap_or_else(|| Self(uuid::Uuid::new_v4().to_string()))
    }
}

/// 为每个请求创建 span，并按路由模板记录请求数与耗时
///
/// 指标的 path 标签取匹配到的路由，未匹配的请求统一记为 `unmatched`。
pub async fn http_tracing(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_string());
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.as_str().to_owned())
        .unwrap_or_default();

    let span = info_span!(
        "http_request",
        method = %method,
        route = %route,
        uri = %request.uri().path(),
        request_id = %request_id,
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    );

    let start = Instant::now();
    let response = next.run(request).instrument(span.clone()).await;
    let latency = start.elapsed();
    let status = response.status().as_u16();

    span.record("status", status);
    span.record("latency_ms", latency.as_millis() as u64);
    metrics::record_http_request(&method, &route, status, latency.as_secs_f64());

    response
}

/// 写入请求 ID 扩展，并在响应头中回传
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let id = RequestId::accept_or_generate(request.headers().get(REQUEST_ID_HEADER));
    let header = HeaderValue::from_str(id.as_str()).ok();
    request.extensions_mut().insert(id);

    let mut response = next.run(request).await;
    if let Some(header) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, header);
    }
    response
}
