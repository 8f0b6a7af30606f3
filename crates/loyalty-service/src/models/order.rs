//! 订单实体

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use super::OrderStatus;

/// 用户上传的订单
///
/// 订单号全局唯一；accrual 仅在 PROCESSED 状态下有意义。
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Order {
    pub number: String,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub accrual: Option<Decimal>,
    pub uploaded_at: DateTime<Utc>,
}

impl Order {
    /// 新上传的订单（状态 NEW）
    pub fn new(number: impl Into<String>, user_id: Uuid) -> Self {
        Self {
            number: number.into(),
            user_id,
            status: OrderStatus::New,
            accrual: None,
            uploaded_at: Utc::now(),
        }
    }

    /// 对外可见的积分：仅 PROCESSED 订单返回
    pub fn visible_accrual(&self) -> Option<Decimal> {
        match self.status {
            OrderStatus::Processed => self.accrual,
            _ => None,
        }
    }
}
