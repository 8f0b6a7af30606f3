//! 应用状态定义

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::JwtManager;
use crate::repository::{OrderRepository, UserRepository, WithdrawalRepository};
use crate::service::{LedgerService, OrderService, UserService, WithdrawalService};

/// Axum 应用共享状态
///
/// 服务通过 Arc 在 handler 间共享
#[derive(Clone)]
pub struct AppState {
    pub jwt_manager: Arc<JwtManager>,
    pub user_service: Arc<UserService>,
    pub order_service: Arc<OrderService>,
    pub ledger_service: Arc<LedgerService>,
    pub withdrawal_service: Arc<WithdrawalService>,
}

impl AppState {
    /// 基于 PostgreSQL 仓储装配全部服务
    pub fn new(pool: PgPool, jwt_manager: JwtManager) -> Self {
        let jwt_manager = Arc::new(jwt_manager);
        let order_repo = Arc::new(OrderRepository::new(pool.clone()));
        let withdrawal_repo = Arc::new(WithdrawalRepository::new(pool.clone()));
        let user_repo = Arc::new(UserRepository::new(pool));

        Self {
            user_service: Arc::new(UserService::new(user_repo, jwt_manager.clone())),
            order_service: Arc::new(OrderService::new(order_repo.clone())),
            ledger_service: Arc::new(LedgerService::new(
                order_repo,
                withdrawal_repo.clone(),
            )),
            withdrawal_service: Arc::new(WithdrawalService::new(withdrawal_repo)),
            jwt_manager,
        }
    }
}
