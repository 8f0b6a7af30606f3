//! 余额计算服务
//!
//! 余额不落库，每次请求根据订单和提现记录重新汇总

use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::error::Result;
use crate::models::Balance;
use crate::repository::{OrderRepositoryTrait, WithdrawalRepositoryTrait};

pub struct LedgerService {
    order_repo: Arc<dyn OrderRepositoryTrait>,
    withdrawal_repo: Arc<dyn WithdrawalRepositoryTrait>,
}

impl LedgerService {
    pub fn new(
        order_repo: Arc<dyn OrderRepositoryTrait>,
        withdrawal_repo: Arc<dyn WithdrawalRepositoryTrait>,
    ) -> Self {
        Self {
            order_repo,
            withdrawal_repo,
        }
    }

    /// 当前余额与累计提现
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn balance(&self, user_id: Uuid) -> Result<Balance> {
        let accrued = self.order_repo.sum_processed_accrual(user_id).await?;
        let withdrawn = self.withdrawal_repo.sum_withdrawn(user_id).await?;
        Ok(Balance::compute(accrued, withdrawn))
    }
}
