//! 提现仓储

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::order_repo::OrderRepository;
use super::traits::{WithdrawalOutcome, WithdrawalRepositoryTrait};
use crate::error::{LoyaltyError, Result};
use crate::models::{Balance, Withdrawal};

/// 提现仓储
///
/// 提现记录只追加。余额校验与写入在同一事务内完成，
/// 同一用户的并发提现通过 users 行锁串行化。
#[derive(Clone)]
pub struct WithdrawalRepository {
    pool: PgPool,
}

impl WithdrawalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Withdrawal>> {
        let withdrawals = sqlx::query_as::<_, Withdrawal>(
            r#"
            SELECT id, user_id, number, sum, processed_at
            FROM withdrawals
            WHERE user_id = $1
            ORDER BY processed_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(withdrawals)
    }

    pub async fn sum_withdrawn(&self, user_id: Uuid) -> Result<Decimal> {
        let mut conn = self.pool.acquire().await?;
        Self::sum_withdrawn_in_tx(&mut conn, user_id).await
    }

    /// 在事务中汇总提现金额
    pub async fn sum_withdrawn_in_tx(tx: &mut PgConnection, user_id: Uuid) -> Result<Decimal> {
        let total = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(sum), 0)
            FROM withdrawals
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(tx)
        .await?;

        Ok(total)
    }

    /// 在事务中插入提现记录
    pub async fn create_in_tx(
        tx: &mut PgConnection,
        user_id: Uuid,
        number: &str,
        sum: Decimal,
    ) -> Result<Withdrawal> {
        let withdrawal = sqlx::query_as::<_, Withdrawal>(
            r#"
            INSERT INTO withdrawals (user_id, number, sum, processed_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, user_id, number, sum, processed_at
            "#,
        )
        .bind(user_id)
        .bind(number)
        .bind(sum)
        .fetch_one(tx)
        .await?;

        Ok(withdrawal)
    }

    /// 锁定用户行，串行化同一用户的余额变更
    async fn lock_user_in_tx(tx: &mut PgConnection, user_id: Uuid) -> Result<()> {
        let locked = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(tx)
            .await?;

        match locked {
            Some(_) => Ok(()),
            None => Err(LoyaltyError::Unauthorized(format!("用户不存在: {}", user_id))),
        }
    }

    /// 校验余额并写入提现
    ///
    /// 1. 锁定用户行
    /// 2. 在事务内重新计算余额
    /// 3. 余额不足则回滚，否则写入并提交
    #[instrument(skip(self), fields(user_id = %user_id, number = %number))]
    pub async fn create_if_covered(
        &self,
        user_id: Uuid,
        number: &str,
        sum: Decimal,
    ) -> Result<WithdrawalOutcome> {
        let mut tx = self.pool.begin().await?;

        Self::lock_user_in_tx(&mut tx, user_id).await?;

        let accrued = OrderRepository::sum_processed_accrual_in_tx(&mut tx, user_id).await?;
        let withdrawn = Self::sum_withdrawn_in_tx(&mut tx, user_id).await?;
        let balance = Balance::compute(accrued, withdrawn);

        if !balance.covers(sum) {
            tx.rollback().await?;
            debug!(current = %balance.current, requested = %sum, "余额不足，回滚提现事务");
            return Ok(WithdrawalOutcome::InsufficientFunds(balance));
        }

        let withdrawal = Self::create_in_tx(&mut tx, user_id, number, sum).await?;
        tx.commit().await?;

        Ok(WithdrawalOutcome::Accepted(withdrawal))
    }
}

#[async_trait]
impl WithdrawalRepositoryTrait for WithdrawalRepository {
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Withdrawal>> {
        self.list_by_user(user_id).await
    }

    async fn sum_withdrawn(&self, user_id: Uuid) -> Result<Decimal> {
        self.sum_withdrawn(user_id).await
    }

    async fn create_if_covered(
        &self,
        user_id: Uuid,
        number: &str,
        sum: Decimal,
    ) -> Result<WithdrawalOutcome> {
        self.create_if_covered(user_id, number, sum).await
    }
}
