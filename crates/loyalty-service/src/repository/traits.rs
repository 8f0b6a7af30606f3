//! 仓储 Trait 定义
//!
//! 服务层和积分轮询任务依赖这些抽象而非具体实现，便于 mock 测试

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Balance, Order, OrderStatus, User, Withdrawal};

/// 原子提现的结果
#[derive(Debug, Clone, PartialEq)]
pub enum WithdrawalOutcome {
    /// 余额充足，提现已写入
    Accepted(Withdrawal),
    /// 余额不足，未写入任何记录；附带当时计算出的余额
    InsufficientFunds(Balance),
}

/// 订单仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepositoryTrait: Send + Sync {
    async fn find_by_number(&self, number: &str) -> Result<Option<Order>>;

    /// 插入 NEW 订单；订单号已存在时不做任何修改并返回 false
    async fn insert_new(&self, number: &str, user_id: Uuid) -> Result<bool>;

    /// 用户的全部订单，按上传时间倒序
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Order>>;

    /// 所有未进入终态的订单
    async fn list_pending(&self) -> Result<Vec<Order>>;

    /// 将订单推进到终态
    ///
    /// 仅当订单当前不是终态时更新；返回 false 表示订单已是终态（或不存在）
    async fn settle(
        &self,
        number: &str,
        status: OrderStatus,
        accrual: Option<Decimal>,
    ) -> Result<bool>;

    /// 用户所有 PROCESSED 订单的积分之和
    async fn sum_processed_accrual(&self, user_id: Uuid) -> Result<Decimal>;
}

/// 提现仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WithdrawalRepositoryTrait: Send + Sync {
    /// 用户的全部提现，按处理时间正序
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Withdrawal>>;

    async fn sum_withdrawn(&self, user_id: Uuid) -> Result<Decimal>;

    /// 在同一事务中校验余额并写入提现
    async fn create_if_covered(
        &self,
        user_id: Uuid,
        number: &str,
        sum: Decimal,
    ) -> Result<WithdrawalOutcome>;
}

/// 用户仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    /// 创建用户；登录名已存在时返回 `LoginTaken`
    async fn create(&self, login: &str, password_hash: &str) -> Result<User>;

    async fn find_by_login(&self, login: &str) -> Result<Option<User>>;
}
