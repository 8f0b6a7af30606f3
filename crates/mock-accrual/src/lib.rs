//! Mock 积分计算系统
//!
//! 本地开发与联调用的内存版积分系统，实现与真实系统相同的查询接口：
//!
//! - `GET /api/orders/{number}`：204 未登记；200 返回 `{order, status, accrual?}`；
//!   超出限流时 429 并带 `Retry-After`
//! - `POST /api/orders`：登记或覆盖一个订单的计算结果（测试辅助接口）
//!
//! # 使用示例
//!
//! ```rust
//! use mock_accrual::store::{AccrualRecord, AccrualStore, MockAccrualStatus};
//!
//! let store = AccrualStore::new();
//! store.upsert(AccrualRecord::processed("12345678903", rust_decimal::Decimal::new(5000, 2)));
//! assert_eq!(store.get("12345678903").unwrap().status, MockAccrualStatus::Processed);
//! ```

pub mod rate_limit;
pub mod service;
pub mod store;

pub use rate_limit::{Admission, FixedWindowLimiter};
pub use service::{AccrualServiceState, accrual_routes};
pub use store::{AccrualRecord, AccrualStore, MockAccrualStatus};
