//! 积分轮询任务
//!
//! 每一轮：
//! 1. 取出所有未进入终态的订单
//! 2. 逐个查询积分系统（网络失败按重试策略退避重试）
//! 3. 终态结果通过条件更新落库，中间状态不写库
//! 4. 收到 429 时放宽轮询间隔并放弃本轮剩余订单
//!
//! 单个订单的解析或持久化失败只记录日志，不影响本轮其它订单。

use std::sync::Arc;
use std::time::Duration;

use loyalty_shared::config::AccrualConfig;
use loyalty_shared::observability::metrics;
use loyalty_shared::retry::{RetryPolicy, retry_with_policy};
use rust_decimal::Decimal;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use super::client::{AccrualClient, AccrualError, AccrualReply, AccrualResponse};
use super::schedule::PollSchedule;
use crate::error::{LoyaltyError, Result};
use crate::models::{AccrualStatus, OrderStatus};
use crate::repository::OrderRepositoryTrait;

/// 单个订单本轮的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrderStep {
    /// 未登记或仍在处理中，本轮不写库
    Unchanged,
    /// 已写入终态
    Settled(OrderStatus),
    /// 终态已存在，条件更新未命中
    AlreadySettled,
    /// 限流，附带 Retry-After
    Throttled(Duration),
    /// 限流但 Retry-After 不可用
    ThrottledWithoutDelay,
}

/// 一轮轮询的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// 全部订单处理完毕
    Completed { pending: usize, settled: usize },
    /// 收到限流，本轮剩余订单放弃
    Throttled { retry_after: Duration },
    /// 收到无法解析的限流响应，本轮剩余订单放弃，间隔不变
    Abandoned,
    /// 收到关闭信号，在订单之间退出
    Interrupted,
    /// 读取待处理订单失败
    Failed,
}

pub struct AccrualPoller {
    order_repo: Arc<dyn OrderRepositoryTrait>,
    client: Arc<dyn AccrualClient>,
    retry_policy: RetryPolicy,
    schedule: PollSchedule,
}

impl AccrualPoller {
    pub fn new(
        order_repo: Arc<dyn OrderRepositoryTrait>,
        client: Arc<dyn AccrualClient>,
        config: &AccrualConfig,
    ) -> Self {
        let retry_policy = RetryPolicy::with_attempts(
            config.max_attempts,
            Duration::from_millis(config.initial_backoff_ms),
            config.backoff_multiplier,
        );

        Self {
            order_repo,
            client,
            retry_policy,
            schedule: PollSchedule::new(config.poll_interval()),
        }
    }

    pub fn schedule(&self) -> &PollSchedule {
        &self.schedule
    }

    /// 主循环：按调度执行轮询，直到收到关闭信号
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            poll_interval = ?self.schedule.base_interval(),
            max_attempts = self.retry_policy.max_attempts(),
            "积分轮询任务已启动"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let wait = self.schedule.until_next(Instant::now());
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    // 发送端被丢弃同样视为关闭
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }

                _ = tokio::time::sleep(wait) => {}
            }

            self.schedule.begin_tick(Instant::now());
            let outcome = self.poll_once(&shutdown).await;
            debug!(?outcome, "本轮积分轮询结束");

            metrics::set_worker_last_run("accrual_poller");

            if outcome == BatchOutcome::Interrupted {
                break;
            }
        }

        info!("收到关闭信号，积分轮询任务退出");
    }

    /// 执行一轮轮询
    pub async fn poll_once(&mut self, shutdown: &watch::Receiver<bool>) -> BatchOutcome {
        let orders = match self.order_repo.list_pending().await {
            Ok(orders) => orders,
            Err(e) => {
                error!(error = %e, "获取待处理订单失败");
                metrics::record_poll_batch(0, false);
                return BatchOutcome::Failed;
            }
        };

        let pending = orders.len();
        let mut settled = 0;

        for order in &orders {
            if *shutdown.borrow() {
                info!(pending, settled, "轮询在订单之间中断");
                metrics::record_poll_batch(pending, false);
                return BatchOutcome::Interrupted;
            }

            match self.poll_order(&order.number).await {
                Ok(OrderStep::Settled(status)) => {
                    settled += 1;
                    metrics::record_order_settled(status.as_str());
                }
                Ok(OrderStep::Unchanged | OrderStep::AlreadySettled) => {}
                Ok(OrderStep::Throttled(requested)) => {
                    let wait = self.schedule.apply_backpressure(Instant::now(), requested);
                    metrics::record_backpressure(self.schedule.interval().as_secs_f64());
                    metrics::record_poll_batch(pending, false);
                    warn!(
                        order_number = %order.number,
                        retry_after_secs = requested.as_secs(),
                        applied_secs = wait.as_secs(),
                        interval_secs = self.schedule.interval().as_secs(),
                        "积分系统限流，放弃本轮剩余订单"
                    );
                    return BatchOutcome::Throttled { retry_after: wait };
                }
                Ok(OrderStep::ThrottledWithoutDelay) => {
                    metrics::record_poll_batch(pending, false);
                    error!(
                        order_number = %order.number,
                        "积分系统返回 429 但 Retry-After 无法解析，放弃本轮剩余订单"
                    );
                    return BatchOutcome::Abandoned;
                }
                Err(e) => {
                    error!(order_number = %order.number, error = %e, "处理订单失败，下一轮再试");
                }
            }
        }

        metrics::record_poll_batch(pending, true);
        BatchOutcome::Completed { pending, settled }
    }

    /// 查询单个订单并应用结果
    #[instrument(skip(self), fields(order_number = %number))]
    async fn poll_order(&self, number: &str) -> Result<OrderStep> {
        let reply = retry_with_policy(
            &self.retry_policy,
            "accrual_fetch",
            AccrualError::is_transient,
            || self.client.fetch(number),
        )
        .await?;

        match reply {
            AccrualReply::NotRegistered => Ok(OrderStep::Unchanged),
            AccrualReply::RateLimited {
                retry_after: Some(wait),
            } => Ok(OrderStep::Throttled(wait)),
            AccrualReply::RateLimited { retry_after: None } => {
                Ok(OrderStep::ThrottledWithoutDelay)
            }
            AccrualReply::Ready(response) => self.apply(number, response).await,
        }
    }

    /// 将积分系统的 200 响应应用到订单
    async fn apply(&self, number: &str, response: AccrualResponse) -> Result<OrderStep> {
        if response.order != number {
            return Err(LoyaltyError::UpstreamProtocol(format!(
                "响应中的订单号不匹配: 期望 {}, 实际 {}",
                number, response.order
            )));
        }

        let status: AccrualStatus = response.status.parse()?;
        let Some(settled_status) = status.settled_status() else {
            debug!(status = %response.status, "订单仍在处理中");
            return Ok(OrderStep::Unchanged);
        };

        let accrual = match settled_status {
            OrderStatus::Processed => {
                let amount = response.accrual.unwrap_or(Decimal::ZERO).round_dp(2);
                if amount < Decimal::ZERO {
                    return Err(LoyaltyError::UpstreamProtocol(format!(
                        "积分不能为负数: {}",
                        amount
                    )));
                }
                Some(amount)
            }
            _ => None,
        };

        if self
            .order_repo
            .settle(number, settled_status, accrual)
            .await?
        {
            info!(status = %settled_status, accrual = ?accrual, "订单进入终态");
            Ok(OrderStep::Settled(settled_status))
        } else {
            debug!("订单已是终态，忽略重复结果");
            Ok(OrderStep::AlreadySettled)
        }
    }
}
