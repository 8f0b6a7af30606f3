//! 订单上传服务
//!
//! 校验订单号并去重写入。订单号全局唯一：
//! - 不存在 -> 以 NEW 状态写入
//! - 已由当前用户上传 -> 幂等返回
//! - 已由其他用户上传 -> 冲突，原记录不变

use std::sync::Arc;

use loyalty_shared::observability::metrics;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{LoyaltyError, Result};
use crate::models::validate_order_number;
use crate::repository::OrderRepositoryTrait;
use crate::service::dto::OrderDto;

/// 订单上传结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 新订单已受理
    Accepted,
    /// 该订单此前已由当前用户上传
    AlreadyOwnedByCaller,
}

pub struct OrderService {
    order_repo: Arc<dyn OrderRepositoryTrait>,
}

impl OrderService {
    pub fn new(order_repo: Arc<dyn OrderRepositoryTrait>) -> Self {
        Self { order_repo }
    }

    /// 上传订单号
    ///
    /// 先以 ON CONFLICT DO NOTHING 插入；未插入时回读归属，
    /// 并发上传同一订单号时也能得到确定的结果。
    #[instrument(skip(self), fields(order_number = %number, user_id = %user_id))]
    pub async fn submit(&self, number: &str, user_id: Uuid) -> Result<SubmitOutcome> {
        if let Err(e) = validate_order_number(number) {
            metrics::record_order_submission("invalid");
            return Err(e);
        }

        if self.order_repo.insert_new(number, user_id).await? {
            info!("订单已受理");
            metrics::record_order_submission("accepted");
            return Ok(SubmitOutcome::Accepted);
        }

        let existing = self.order_repo.find_by_number(number).await?.ok_or_else(|| {
            LoyaltyError::Internal(format!("订单插入冲突但查询不到记录: {}", number))
        })?;

        if existing.user_id == user_id {
            metrics::record_order_submission("duplicate");
            Ok(SubmitOutcome::AlreadyOwnedByCaller)
        } else {
            warn!(owner = %existing.user_id, "订单号已被其他用户上传");
            metrics::record_order_submission("conflict");
            Err(LoyaltyError::OrderConflict(number.to_string()))
        }
    }

    /// 用户的订单列表，按上传时间倒序
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_orders(&self, user_id: Uuid) -> Result<Vec<OrderDto>> {
        let orders = self.order_repo.list_by_user(user_id).await?;
        Ok(orders.into_iter().map(OrderDto::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Order, OrderStatus};
    use crate::repository::MockOrderRepositoryTrait;

    const NUMBER: &str = "12345678903";

    fn service(repo: MockOrderRepositoryTrait) -> OrderService {
        OrderService::new(Arc::new(repo))
    }

    #[tokio::test]
    async fn test_submit_new_order() {
        let user_id = Uuid::new_v4();
        let mut repo = MockOrderRepositoryTrait::new();
        repo.expect_insert_new()
            .withf(move |number, owner| number == NUMBER && *owner == user_id)
            .times(1)
            .returning(|_, _| Ok(true));
        repo.expect_find_by_number().never();

        let outcome = service(repo).submit(NUMBER, user_id).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Accepted);
    }

    #[tokio::test]
    async fn test_submit_same_owner_twice() {
        let user_id = Uuid::new_v4();
        let mut repo = MockOrderRepositoryTrait::new();
        let mut inserted = false;
        repo.expect_insert_new().times(2).returning(move |_, _| {
            let first = !inserted;
            inserted = true;
            Ok(first)
        });
        repo.expect_find_by_number()
            .times(1)
            .returning(move |number| Ok(Some(Order::new(number, user_id))));

        let service = service(repo);
        assert_eq!(
            service.submit(NUMBER, user_id).await.unwrap(),
            SubmitOutcome::Accepted
        );
        assert_eq!(
            service.submit(NUMBER, user_id).await.unwrap(),
            SubmitOutcome::AlreadyOwnedByCaller
        );
    }

    #[tokio::test]
    async fn test_submit_owned_by_another_user() {
        let owner = Uuid::new_v4();
        let caller = Uuid::new_v4();
        let mut repo = MockOrderRepositoryTrait::new();
        repo.expect_insert_new().returning(|_, _| Ok(false));
        repo.expect_find_by_number()
            .returning(move |number| Ok(Some(Order::new(number, owner))));

        let err = service(repo).submit(NUMBER, caller).await.unwrap_err();
        assert!(matches!(err, LoyaltyError::OrderConflict(ref n) if n == NUMBER));
    }

    #[tokio::test]
    async fn test_submit_invalid_number_skips_storage() {
        let mut repo = MockOrderRepositoryTrait::new();
        repo.expect_insert_new().never();
        repo.expect_find_by_number().never();

        let service = service(repo);
        for number in ["12345678904", "", "12a45"] {
            let err = service.submit(number, Uuid::new_v4()).await.unwrap_err();
            assert!(matches!(err, LoyaltyError::InvalidOrderNumber(_)));
        }
    }

    #[tokio::test]
    async fn test_submit_propagates_database_error() {
        let mut repo = MockOrderRepositoryTrait::new();
        repo.expect_insert_new()
            .returning(|_, _| Err(LoyaltyError::Database(sqlx::Error::PoolTimedOut)));

        let err = service(repo).submit(NUMBER, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, LoyaltyError::Database(_)));
    }

    #[tokio::test]
    async fn test_list_orders_maps_to_dto() {
        let user_id = Uuid::new_v4();
        let mut repo = MockOrderRepositoryTrait::new();
        repo.expect_list_by_user().returning(move |owner| {
            let mut processed = Order::new("79927398713", owner);
            processed.status = OrderStatus::Processed;
            processed.accrual = Some(rust_decimal::Decimal::new(5000, 2));
            Ok(vec![processed, Order::new(NUMBER, owner)])
        });

        let orders = service(repo).list_orders(user_id).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].number, "79927398713");
        assert_eq!(orders[0].accrual, Some(rust_decimal::Decimal::new(5000, 2)));
        assert_eq!(orders[1].status, OrderStatus::New);
        assert_eq!(orders[1].accrual, None);
    }
}
