//! 数据库仓储层
//!
//! 封装订单、提现、用户三张表的 SQL 操作。
//!
//! - 仓储只负责持久化，不包含业务规则
//! - 需要在事务中复用的查询提供 `*_in_tx` 静态版本
//! - 通过 trait 暴露给服务层，测试时用 mockall 生成的 mock 替换

mod order_repo;
mod traits;
mod user_repo;
mod withdrawal_repo;

pub use order_repo::OrderRepository;
pub use traits::*;
pub use user_repo::UserRepository;
pub use withdrawal_repo::WithdrawalRepository;

/// 是否为唯一约束冲突（PostgreSQL 23505）
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}
