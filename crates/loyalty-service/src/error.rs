//! 积分服务错误类型
//!
//! 业务错误与系统错误统一为 `LoyaltyError`，在 HTTP 边界映射为状态码和 JSON 响应体。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use loyalty_shared::observability::tracing::current_trace_id;
use serde_json::json;

/// 积分服务错误类型
#[derive(Debug, thiserror::Error)]
pub enum LoyaltyError {
    // === 请求校验 ===
    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("订单号格式错误: {0}")]
    InvalidOrderNumber(String),

    #[error("请求格式错误: {0}")]
    BadRequest(String),

    // === 业务冲突 ===
    #[error("订单已被其他用户上传: {0}")]
    OrderConflict(String),

    #[error("登录名已被占用: {0}")]
    LoginTaken(String),

    #[error("余额不足")]
    InsufficientFunds,

    // === 认证 ===
    #[error("登录名或密码错误")]
    InvalidCredentials,

    #[error("未授权: {0}")]
    Unauthorized(String),

    // === 积分系统 ===
    #[error("积分系统暂时不可用: {0}")]
    UpstreamTransient(String),

    #[error("积分系统响应不符合协议: {0}")]
    UpstreamProtocol(String),

    // === 系统错误 ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl LoyaltyError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidOrderNumber(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::OrderConflict(_) | Self::LoginTaken(_) => StatusCode::CONFLICT,
            Self::InsufficientFunds => StatusCode::PAYMENT_REQUIRED,
            Self::InvalidCredentials | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::UpstreamTransient(_) | Self::UpstreamProtocol(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidOrderNumber(_) => "INVALID_ORDER_NUMBER",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::OrderConflict(_) => "ORDER_CONFLICT",
            Self::LoginTaken(_) => "LOGIN_TAKEN",
            Self::InsufficientFunds => "INSUFFICIENT_FUNDS",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::UpstreamTransient(_) => "UPSTREAM_TRANSIENT",
            Self::UpstreamProtocol(_) => "UPSTREAM_PROTOCOL",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for LoyaltyError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志
        let message = match &self {
            Self::Database(e) => {
                let trace_id = current_trace_id().unwrap_or_default();
                tracing::error!(error = %e, trace_id = %trace_id, "数据库操作失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Internal(e) => {
                let trace_id = current_trace_id().unwrap_or_default();
                tracing::error!(error = %e, trace_id = %trace_id, "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 服务层 Result 类型别名
pub type Result<T> = std::result::Result<T, LoyaltyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            LoyaltyError::InvalidOrderNumber("123".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            LoyaltyError::OrderConflict("79927398713".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            LoyaltyError::InsufficientFunds.status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            LoyaltyError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            LoyaltyError::Database(sqlx::Error::PoolTimedOut).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_into_response_hides_database_details() {
        let response = LoyaltyError::Database(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["code"], "DATABASE_ERROR");
        assert_eq!(value["message"], "服务内部错误，请稍后重试");
    }
}
