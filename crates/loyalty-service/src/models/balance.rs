//! 用户余额（派生值）

use rust_decimal::Decimal;
use serde::Serialize;

/// 用户余额
///
/// current = 已完成订单积分之和 - 提现之和；withdrawn = 提现之和
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Balance {
    #[serde(with = "rust_decimal::serde::float")]
    pub current: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub withdrawn: Decimal,
}

impl Balance {
    pub fn compute(accrued: Decimal, withdrawn: Decimal) -> Self {
        Self {
            current: accrued - withdrawn,
            withdrawn,
        }
    }

    /// 当前余额是否足以支付 sum
    pub fn covers(&self, sum: Decimal) -> bool {
        self.current >= sum
    }
}
