//! 内存存储
//!
//! 以订单号为 key 的 DashMap，保存每个订单当前的计算结果。

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 积分计算状态，与真实系统的字符串取值一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MockAccrualStatus {
    Registered,
    Processing,
    Invalid,
    Processed,
}

impl MockAccrualStatus {
    pub fn is_final(self) -> bool {
        matches!(self, Self::Invalid | Self::Processed)
    }
}

/// 单个订单的计算结果，也是 GET 接口的响应体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccrualRecord {
    pub order: String,
    pub status: MockAccrualStatus,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub accrual: Option<Decimal>,
}

impl AccrualRecord {
    pub fn registered(order: &str) -> Self {
        Self {
            order: order.to_string(),
            status: MockAccrualStatus::Registered,
            accrual: None,
        }
    }

    pub fn processed(order: &str, accrual: Decimal) -> Self {
        Self {
            order: order.to_string(),
            status: MockAccrualStatus::Processed,
            accrual: Some(accrual),
        }
    }

    /// 自动推进模式下的下一状态：REGISTERED -> PROCESSING -> PROCESSED
    ///
    /// 积分按订单号各位数字之和计算，结果可复现。
    fn advanced(&self) -> Self {
        match self.status {
            MockAccrualStatus::Registered => Self {
                status: MockAccrualStatus::Processing,
                ..self.clone()
            },
            MockAccrualStatus::Processing => {
                Self::processed(&self.order, digit_sum_accrual(&self.order))
            }
            _ => self.clone(),
        }
    }
}

fn digit_sum_accrual(order: &str) -> Decimal {
    let sum: u32 = order.chars().filter_map(|c| c.to_digit(10)).sum();
    Decimal::from(sum * 10)
}

/// 订单计算结果存储
#[derive(Debug, Clone, Default)]
pub struct AccrualStore {
    records: Arc<DashMap<String, AccrualRecord>>,
}

impl AccrualStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或覆盖
    pub fn upsert(&self, record: AccrualRecord) {
        self.records.insert(record.order.clone(), record);
    }

    /// 仅在订单未登记时插入，返回是否插入成功
    pub fn register(&self, record: AccrualRecord) -> bool {
        match self.records.entry(record.order.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    pub fn get(&self, order: &str) -> Option<AccrualRecord> {
        self.records.get(order).map(|r| r.clone())
    }

    /// 查询并推进状态（自动模式）
    ///
    /// 未登记的订单先登记为 REGISTERED；每次查询返回当前状态后推进一步。
    pub fn observe_and_advance(&self, order: &str) -> AccrualRecord {
        let mut entry = self
            .records
            .entry(order.to_string())
            .or_insert_with(|| AccrualRecord::registered(order));
        let current = entry.value().clone();
        *entry = current.advanced();
        current
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }
}
