//! 订单与积分系统状态枚举

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LoyaltyError;

/// 订单状态
///
/// 状态机：NEW -> REGISTERED/PROCESSING -> INVALID/PROCESSED。
/// INVALID 和 PROCESSED 为终态，只有积分轮询任务会推进状态。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// 已上传，尚未被积分系统处理
    #[default]
    New,
    /// 积分系统已登记
    Registered,
    /// 积分计算中
    Processing,
    /// 积分系统拒绝计算（终态）
    Invalid,
    /// 积分计算完成（终态）
    Processed,
}

impl OrderStatus {
    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Invalid | Self::Processed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Registered => "REGISTERED",
            Self::Processing => "PROCESSING",
            Self::Invalid => "INVALID",
            Self::Processed => "PROCESSED",
        }
    }

    /// 终态列表，用于 SQL 过滤
    pub fn terminal_values() -> [&'static str; 2] {
        [Self::Invalid.as_str(), Self::Processed.as_str()]
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 积分系统返回的订单状态
///
/// 只接受协议定义的四种取值，其余字符串视为协议错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccrualStatus {
    Registered,
    Processing,
    Invalid,
    Processed,
}

impl AccrualStatus {
    /// 需要持久化的终态；中间状态返回 None
    pub fn settled_status(&self) -> Option<OrderStatus> {
        match self {
            Self::Registered | Self::Processing => None,
            Self::Invalid => Some(OrderStatus::Invalid),
            Self::Processed => Some(OrderStatus::Processed),
        }
    }
}

impl FromStr for AccrualStatus {
    type Err = LoyaltyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REGISTERED" => Ok(Self::Registered),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            other => Err(LoyaltyError::UpstreamProtocol(format!(
                "未知的积分状态: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(!OrderStatus::New.is_terminal());
        assert!(!OrderStatus::Registered.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(OrderStatus::Invalid.is_terminal());
        assert!(OrderStatus::Processed.is_terminal());
        assert_eq!(OrderStatus::terminal_values(), ["INVALID", "PROCESSED"]);
    }

    #[test]
    fn test_order_status_serialization() {
        let json = serde_json::to_string(&OrderStatus::Processing).unwrap();
        assert_eq!(json, "\"PROCESSING\"");
        assert_eq!(OrderStatus::Processed.to_string(), "PROCESSED");
    }

    #[test]
    fn test_accrual_status_parsing() {
        assert_eq!(
            "PROCESSED".parse::<AccrualStatus>().unwrap(),
            AccrualStatus::Processed
        );
        assert_eq!(
            AccrualStatus::Registered.settled_status(),
            None
        );
        assert_eq!(
            AccrualStatus::Invalid.settled_status(),
            Some(OrderStatus::Invalid)
        );

        // NEW 不属于积分系统协议
        let err = "NEW".parse::<AccrualStatus>().unwrap_err();
        assert!(matches!(err, LoyaltyError::UpstreamProtocol(_)));
        assert!("processed".parse::<AccrualStatus>().is_err());
    }
}
