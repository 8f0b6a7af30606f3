//! 服务层
//!
//! HTTP 处理器同步调用的业务逻辑：订单上传、余额计算、提现、注册登录。
//! 服务依赖仓储 trait，由 main 注入 PostgreSQL 实现。

pub mod dto;
mod ledger_service;
mod order_service;
mod user_service;
mod withdrawal_service;

pub use ledger_service::LedgerService;
pub use order_service::{OrderService, SubmitOutcome};
pub use user_service::UserService;
pub use withdrawal_service::WithdrawalService;
