//! 订单仓储

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::traits::OrderRepositoryTrait;
use crate::error::Result;
use crate::models::{Order, OrderStatus};

/// 订单仓储
///
/// orders.number 上的主键保证订单号全局唯一，并发上传由数据库仲裁
#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_number(&self, number: &str) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT number, user_id, status, accrual, uploaded_at
            FROM orders
            WHERE number = $1
            "#,
        )
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// 插入新订单
    ///
    /// 使用 ON CONFLICT DO NOTHING，已存在的订单记录保持不变
    pub async fn insert_new(&self, number: &str, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO orders (number, user_id, status, uploaded_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (number) DO NOTHING
            "#,
        )
        .bind(number)
        .bind(user_id)
        .bind(OrderStatus::New)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT number, user_id, status, accrual, uploaded_at
            FROM orders
            WHERE user_id = $1
            ORDER BY uploaded_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// 列出待轮询的订单，先上传的先处理
    pub async fn list_pending(&self) -> Result<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT number, user_id, status, accrual, uploaded_at
            FROM orders
            WHERE status <> ALL($1)
            ORDER BY uploaded_at ASC
            "#,
        )
        .bind(&OrderStatus::terminal_values()[..])
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// 条件更新到终态
    ///
    /// WHERE 条件排除已是终态的订单，重复应用同一结果不会改变存储状态
    pub async fn settle(
        &self,
        number: &str,
        status: OrderStatus,
        accrual: Option<Decimal>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, accrual = $3
            WHERE number = $1 AND status <> ALL($4)
            "#,
        )
        .bind(number)
        .bind(status)
        .bind(accrual)
        .bind(&OrderStatus::terminal_values()[..])
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn sum_processed_accrual(&self, user_id: Uuid) -> Result<Decimal> {
        let mut conn = self.pool.acquire().await?;
        Self::sum_processed_accrual_in_tx(&mut conn, user_id).await
    }

    /// 在事务中汇总已完成订单的积分
    pub async fn sum_processed_accrual_in_tx(
        tx: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Decimal> {
        let total = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(accrual), 0)
            FROM orders
            WHERE user_id = $1 AND status = $2
            "#,
        )
        .bind(user_id)
        .bind(OrderStatus::Processed)
        .fetch_one(tx)
        .await?;

        Ok(total)
    }
}

#[async_trait]
impl OrderRepositoryTrait for OrderRepository {
    async fn find_by_number(&self, number: &str) -> Result<Option<Order>> {
        self.find_by_number(number).await
    }

    async fn insert_new(&self, number: &str, user_id: Uuid) -> Result<bool> {
        self.insert_new(number, user_id).await
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
        self.list_by_user(user_id).await
    }

    async fn list_pending(&self) -> Result<Vec<Order>> {
        self.list_pending().await
    }

    async fn settle(
        &self,
        number: &str,
        status: OrderStatus,
        accrual: Option<Decimal>,
    ) -> Result<bool> {
        self.settle(number, status, accrual).await
    }

    async fn sum_processed_accrual(&self, user_id: Uuid) -> Result<Decimal> {
        self.sum_processed_accrual(user_id).await
    }
}
