//! 提现服务
//!
//! 校验订单号和金额后，将余额检查与写入交给仓储在同一事务中完成

use std::sync::Arc;

use loyalty_shared::observability::metrics;
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{LoyaltyError, Result};
use crate::models::{Withdrawal, validate_order_number};
use crate::repository::{WithdrawalOutcome, WithdrawalRepositoryTrait};
use crate::service::dto::WithdrawalDto;

/// 金额精度（与 NUMERIC(12,2) 一致）
const AMOUNT_SCALE: u32 = 2;

pub struct WithdrawalService {
    withdrawal_repo: Arc<dyn WithdrawalRepositoryTrait>,
}

impl WithdrawalService {
    pub fn new(withdrawal_repo: Arc<dyn WithdrawalRepositoryTrait>) -> Self {
        Self { withdrawal_repo }
    }

    /// 申请提现
    #[instrument(skip(self), fields(order_number = %number, user_id = %user_id, sum = %sum))]
    pub async fn withdraw(&self, user_id: Uuid, number: &str, sum: Decimal) -> Result<Withdrawal> {
        if let Err(e) = validate_order_number(number) {
            metrics::record_withdrawal("invalid");
            return Err(e);
        }

        if sum <= Decimal::ZERO {
            metrics::record_withdrawal("invalid");
            return Err(LoyaltyError::Validation(format!("提现金额必须大于 0: {}", sum)));
        }
        // 不做舍入，扣减的必须是客户端提交的金额
        if sum.normalize().scale() > AMOUNT_SCALE {
            metrics::record_withdrawal("invalid");
            return Err(LoyaltyError::Validation(format!(
                "提现金额最多保留 {} 位小数: {}",
                AMOUNT_SCALE, sum
            )));
        }

        match self
            .withdrawal_repo
            .create_if_covered(user_id, number, sum)
            .await?
        {
            WithdrawalOutcome::Accepted(withdrawal) => {
                info!(withdrawal_id = withdrawal.id, "提现成功");
                metrics::record_withdrawal("accepted");
                Ok(withdrawal)
            }
            WithdrawalOutcome::InsufficientFunds(balance) => {
                warn!(current = %balance.current, "余额不足，拒绝提现");
                metrics::record_withdrawal("insufficient_funds");
                Err(LoyaltyError::InsufficientFunds)
            }
        }
    }

    /// 用户的提现记录，按处理时间正序
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_withdrawals(&self, user_id: Uuid) -> Result<Vec<WithdrawalDto>> {
        let withdrawals = self.withdrawal_repo.list_by_user(user_id).await?;
        Ok(withdrawals.into_iter().map(WithdrawalDto::from).collect())
    }
}
