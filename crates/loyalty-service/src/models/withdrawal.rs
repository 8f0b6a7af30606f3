//! 提现记录

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// 提现记录，只追加、不修改
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Withdrawal {
    pub id: i64,
    pub user_id: Uuid,
    /// 提现关联的订单号，与订单表的编号空间相互独立
    pub number: String,
    pub sum: Decimal,
    pub processed_at: DateTime<Utc>,
}
