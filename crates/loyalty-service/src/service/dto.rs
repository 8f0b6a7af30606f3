//! 服务层 DTO
//!
//! 对外 JSON 使用 snake_case 字段名，金额输出为数字，时间输出为 RFC 3339

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Order, OrderStatus, Withdrawal};

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// 注册 / 登录请求
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsRequest {
    pub login: String,
    pub password: String,
}

/// 提现请求
#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawRequest {
    pub order: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub sum: Decimal,
}

/// 订单列表项
#[derive(Debug, Clone, Serialize)]
pub struct OrderDto {
    pub number: String,
    pub status: OrderStatus,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub accrual: Option<Decimal>,
    pub uploaded_at: String,
}

impl From<Order> for OrderDto {
    fn from(order: Order) -> Self {
        Self {
            accrual: order.visible_accrual(),
            number: order.number,
            status: order.status,
            uploaded_at: rfc3339(order.uploaded_at),
        }
    }
}

/// 提现列表项
#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalDto {
    pub number: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub sum: Decimal,
    pub processed_at: String,
}

impl From<Withdrawal> for WithdrawalDto {
    fn from(withdrawal: Withdrawal) -> Self {
        Self {
            number: withdrawal.number,
            sum: withdrawal.sum,
            processed_at: rfc3339(withdrawal.processed_at),
        }
    }
}
