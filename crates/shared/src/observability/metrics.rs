//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Metrics 资源守卫
pub struct MetricsHandle {
    _server_handle: tokio::task::JoinHandle<()>,
}

/// 初始化 Prometheus 指标导出
///
/// 启动一个独立的 HTTP 服务器在指定端口暴露 `/metrics` 端点。
pub async fn init(service_name: &str, port: u16) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    register_common_metrics(service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle {
        _server_handle: server_handle,
    })
}

/// 注册通用指标描述
///
/// 这些描述会出现在 /metrics 端点的 HELP 注释中
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    metrics::describe_counter!(
        "accrual_requests_total",
        "Accrual system requests by outcome"
    );
    metrics::describe_histogram!(
        "accrual_request_duration_seconds",
        "Accrual system request duration in seconds"
    );
    metrics::describe_counter!(
        "accrual_orders_settled_total",
        "Orders moved to a terminal status by the accrual poller"
    );
    metrics::describe_counter!("accrual_poll_batches_total", "Accrual poll batches run");
    metrics::describe_counter!(
        "accrual_backpressure_total",
        "Rate-limit responses received from the accrual system"
    );
    metrics::describe_gauge!(
        "accrual_poll_interval_seconds",
        "Current accrual poll interval"
    );

    metrics::describe_counter!("order_submissions_total", "Order submissions by outcome");
    metrics::describe_counter!("withdrawals_total", "Withdrawal requests by outcome");

    metrics::describe_gauge!(
        "worker_last_run_timestamp",
        "Unix timestamp of the last completed worker cycle"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 启动指标 HTTP 服务器
async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(server_handle)
}

// ============================================================================
// 便捷的指标记录函数
// ============================================================================

/// 记录 HTTP 请求
#[inline]
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str.clone()
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str
    )
    .record(duration_secs);
}

/// 记录一次积分系统请求
///
/// outcome: ok / no_content / rate_limited / transport_error / protocol_error
#[inline]
pub fn record_accrual_request(outcome: &'static str, duration_secs: f64) {
    metrics::counter!("accrual_requests_total", "outcome" => outcome).increment(1);
    metrics::histogram!("accrual_request_duration_seconds", "outcome" => outcome)
        .record(duration_secs);
}

/// 记录订单进入终态
#[inline]
pub fn record_order_settled(status: &str) {
    metrics::counter!("accrual_orders_settled_total", "status" => status.to_string()).increment(1);
}

/// 记录一轮轮询
#[inline]
pub fn record_poll_batch(orders: usize, completed: bool) {
    metrics::counter!(
        "accrual_poll_batches_total",
        "completed" => completed.to_string()
    )
    .increment(1);
    metrics::gauge!("accrual_pending_orders").set(orders as f64);
}

/// 记录积分系统限流，并更新当前轮询间隔
#[inline]
pub fn record_backpressure(interval_secs: f64) {
    metrics::counter!("accrual_backpressure_total").increment(1);
    metrics::gauge!("accrual_poll_interval_seconds").set(interval_secs);
}

/// 记录订单提交结果
#[inline]
pub fn record_order_submission(outcome: &'static str) {
    metrics::counter!("order_submissions_total", "outcome" => outcome).increment(1);
}

/// 记录提现结果
#[inline]
pub fn record_withdrawal(outcome: &'static str) {
    metrics::counter!("withdrawals_total", "outcome" => outcome).increment(1);
}

/// 记录 Worker 最近一次完成的时间
#[inline]
pub fn set_worker_last_run(worker: &str) {
    metrics::gauge!("worker_last_run_timestamp", "worker" => worker.to_string())
        .set(chrono::Utc::now().timestamp() as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_functions_do_not_panic() {
        // 即使没有初始化 recorder，这些函数也不应该 panic
        record_http_request("GET", "/api/user/balance", 200, 0.1);
        record_accrual_request("ok", 0.05);
        record_order_settled("PROCESSED");
        record_poll_batch(3, true);
        record_backpressure(30.0);
        record_order_submission("accepted");
        record_withdrawal("insufficient_funds");
        set_worker_last_run("accrual_poller");
    }
}
