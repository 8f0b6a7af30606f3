//! 积分系统 HTTP 客户端
//!
//! `GET {address}/api/orders/{number}`：
//! - 200 + JSON `{order, status, accrual?}`
//! - 204 订单未在积分系统登记
//! - 429 + `Retry-After` 秒数

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use loyalty_shared::config::AccrualConfig;
use loyalty_shared::observability::{metrics, tracing::inject_to_headers};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::LoyaltyError;

/// 积分系统客户端错误
#[derive(Debug, thiserror::Error)]
pub enum AccrualError {
    /// 网络层失败（连接失败、超时、读取响应体失败），可重试
    #[error("请求积分系统失败: {0}")]
    Transport(String),

    /// 响应不符合协议，重试无意义
    #[error("积分系统响应不符合协议: {0}")]
    Protocol(String),
}

impl AccrualError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for AccrualError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<AccrualError> for LoyaltyError {
    fn from(err: AccrualError) -> Self {
        match err {
            AccrualError::Transport(msg) => Self::UpstreamTransient(msg),
            AccrualError::Protocol(msg) => Self::UpstreamProtocol(msg),
        }
    }
}

/// 积分系统 200 响应体
///
/// status 保留原始字符串，由调用方映射到 `AccrualStatus`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccrualResponse {
    pub order: String,
    pub status: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub accrual: Option<Decimal>,
}

/// 积分系统对单个订单的答复
#[derive(Debug, Clone, PartialEq)]
pub enum AccrualReply {
    /// 204：订单尚未登记
    NotRegistered,
    /// 429：限流；Retry-After 缺失或无法解析时为 None
    RateLimited { retry_after: Option<Duration> },
    /// 200：订单状态
    Ready(AccrualResponse),
}

/// 积分系统客户端接口
#[async_trait]
pub trait AccrualClient: Send + Sync {
    async fn fetch(&self, number: &str) -> Result<AccrualReply, AccrualError>;
}

/// 解析 Retry-After（仅支持秒数形式）
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// 基于 reqwest 的积分系统客户端
#[derive(Clone)]
pub struct HttpAccrualClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAccrualClient {
    pub fn new(config: &AccrualConfig) -> Result<Self, AccrualError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url(),
        })
    }

    fn order_url(&self, number: &str) -> String {
        format!("{}/api/orders/{}", self.base_url, number)
    }

    async fn send(&self, number: &str) -> Result<AccrualReply, AccrualError> {
        let mut trace_headers = HashMap::new();
        inject_to_headers(&mut trace_headers);

        let mut request = self.client.get(self.order_url(number));
        for (key, value) in trace_headers {
            request = request.header(key, value);
        }

        let response = request.send().await?;
        let status = response.status();

        match status {
            StatusCode::NO_CONTENT => Ok(AccrualReply::NotRegistered),
            StatusCode::TOO_MANY_REQUESTS => Ok(AccrualReply::RateLimited {
                retry_after: parse_retry_after(response.headers()),
            }),
            StatusCode::OK => {
                let body = response.bytes().await?;
                let parsed: AccrualResponse = serde_json::from_slice(&body)
                    .map_err(|e| AccrualError::Protocol(format!("响应体解析失败: {}", e)))?;
                Ok(AccrualReply::Ready(parsed))
            }
            other => Err(AccrualError::Protocol(format!("意外的状态码: {}", other))),
        }
    }
}

#[async_trait]
impl AccrualClient for HttpAccrualClient {
    #[instrument(skip(self), fields(order_number = %number))]
    async fn fetch(&self, number: &str) -> Result<AccrualReply, AccrualError> {
        let start = Instant::now();
        let result = self.send(number).await;

        let outcome = match &result {
            Ok(AccrualReply::NotRegistered) => "no_content",
            Ok(AccrualReply::RateLimited { .. }) => "rate_limited",
            Ok(AccrualReply::Ready(_)) => "ok",
            Err(AccrualError::Transport(_)) => "transport_error",
            Err(AccrualError::Protocol(_)) => "protocol_error",
        };
        metrics::record_accrual_request(outcome, start.elapsed().as_secs_f64());
        debug!(outcome, "积分系统请求完成");

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("60"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(60)));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn test_decode_response() {
        let body = r#"{"order": "12345678903", "status": "PROCESSED", "accrual": 729.98}"#;
        let parsed: AccrualResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.status, "PROCESSED");
        assert_eq!(parsed.accrual, Some(dec!(729.98)));

        let body = r#"{"order": "12345678903", "status": "REGISTERED"}"#;
        let parsed: AccrualResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.accrual, None);
    }

    #[test]
    fn test_order_url() {
        let client = HttpAccrualClient::new(&AccrualConfig {
            address: "localhost:8081/".to_string(),
            ..AccrualConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.order_url("12345678903"),
            "http://localhost:8081/api/orders/12345678903"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(AccrualError::Transport("timeout".into()).is_transient());
        assert!(!AccrualError::Protocol("bad json".into()).is_transient());

        let err: LoyaltyError = AccrualError::Protocol("bad json".into()).into();
        assert!(matches!(err, LoyaltyError::UpstreamProtocol(_)));
    }
}
