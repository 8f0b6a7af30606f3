//! PostgreSQL 仓储与轮询任务集成测试
//!
//! 需要可用的数据库：`DATABASE_URL=... cargo test -- --ignored`

mod common;

use std::sync::Arc;
use std::time::Duration;

use loyalty_service::accrual::{AccrualPoller, BatchOutcome, HttpAccrualClient};
use loyalty_service::repository::{OrderRepository, WithdrawalOutcome, WithdrawalRepository};
use loyalty_service::service::{LedgerService, OrderService, SubmitOutcome};
use loyalty_service::{LoyaltyError, OrderStatus};
use loyalty_shared::config::AccrualConfig;
use mock_accrual::{AccrualRecord, AccrualServiceState, FixedWindowLimiter, accrual_routes};
use rust_decimal_macros::dec;
use tokio::sync::watch;

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_order_admission_dedup() {
    let pool = common::test_pool().await;
    let alice = common::create_user(&pool).await;
    let bob = common::create_user(&pool).await;
    let service = OrderService::new(Arc::new(OrderRepository::new(pool.clone())));
    let number = common::next_order_number();

    assert_eq!(
        service.submit(&number, alice.id).await.unwrap(),
        SubmitOutcome::Accepted
    );
    assert_eq!(
        service.submit(&number, alice.id).await.unwrap(),
        SubmitOutcome::AlreadyOwnedByCaller
    );
    assert!(matches!(
        service.submit(&number, bob.id).await,
        Err(LoyaltyError::OrderConflict(_))
    ));

    let stored = OrderRepository::new(pool.clone())
        .find_by_number(&number)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.user_id, alice.id);
    assert_eq!(stored.status, OrderStatus::New);
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_long_order_numbers_are_stored() {
    let pool = common::test_pool().await;
    let user = common::create_user(&pool).await;
    let orders = OrderRepository::new(pool.clone());
    let service = OrderService::new(Arc::new(orders.clone()));
    let withdrawals = WithdrawalRepository::new(pool.clone());

    // 订单号长度不设上限，超过 100 位的合法订单号也能入库
    let long_number = |prefix: &str| {
        common::with_check_digit(&format!("{}{}", prefix.repeat(50), common::next_order_number()))
    };
    let number = long_number("18");
    assert!(number.len() > 100);
    assert_eq!(
        service.submit(&number, user.id).await.unwrap(),
        SubmitOutcome::Accepted
    );
    orders
        .settle(&number, OrderStatus::Processed, Some(dec!(40)))
        .await
        .unwrap();

    let withdraw_number = long_number("27");
    let outcome = withdrawals
        .create_if_covered(user.id, &withdraw_number, dec!(15.5))
        .await
        .unwrap();
    assert!(matches!(outcome, WithdrawalOutcome::Accepted(_)));

    let stored = orders.find_by_number(&number).await.unwrap().unwrap();
    assert_eq!(stored.number, number);
    let listed = withdrawals.list_by_user(user.id).await.unwrap();
    assert_eq!(listed[0].number, withdraw_number);
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_settle_is_idempotent() {
    let pool = common::test_pool().await;
    let user = common::create_user(&pool).await;
    let repo = OrderRepository::new(pool.clone());
    let number = common::next_order_number();
    assert!(repo.insert_new(&number, user.id).await.unwrap());

    assert!(
        repo.settle(&number, OrderStatus::Processed, Some(dec!(50)))
            .await
            .unwrap()
    );
    let first = repo.find_by_number(&number).await.unwrap().unwrap();

    // 终态不会被再次修改
    assert!(
        !repo
            .settle(&number, OrderStatus::Processed, Some(dec!(50)))
            .await
            .unwrap()
    );
    assert!(
        !repo
            .settle(&number, OrderStatus::Invalid, None)
            .await
            .unwrap()
    );
    let second = repo.find_by_number(&number).await.unwrap().unwrap();

    assert_eq!(first, second);
    assert_eq!(second.accrual, Some(dec!(50)));
    assert!(
        !repo
            .list_pending()
            .await
            .unwrap()
            .iter()
            .any(|o| o.number == number)
    );
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_withdrawal_checks_balance() {
    let pool = common::test_pool().await;
    let user = common::create_user(&pool).await;
    let orders = OrderRepository::new(pool.clone());
    let withdrawals = WithdrawalRepository::new(pool.clone());
    let ledger = LedgerService::new(Arc::new(orders.clone()), Arc::new(withdrawals.clone()));

    let number = common::next_order_number();
    orders.insert_new(&number, user.id).await.unwrap();
    orders
        .settle(&number, OrderStatus::Processed, Some(dec!(100)))
        .await
        .unwrap();

    let outcome = withdrawals
        .create_if_covered(user.id, &common::next_order_number(), dec!(150))
        .await
        .unwrap();
    assert!(matches!(outcome, WithdrawalOutcome::InsufficientFunds(b) if b.current == dec!(100)));
    assert!(withdrawals.list_by_user(user.id).await.unwrap().is_empty());

    let before = ledger.balance(user.id).await.unwrap();
    let first = common::next_order_number();
    let second = common::next_order_number();
    for (number, sum) in [(&first, dec!(30.25)), (&second, dec!(20))] {
        let outcome = withdrawals
            .create_if_covered(user.id, number, sum)
            .await
            .unwrap();
        assert!(matches!(outcome, WithdrawalOutcome::Accepted(_)));
    }
    let after = ledger.balance(user.id).await.unwrap();

    assert_eq!(after.current, before.current - dec!(50.25));
    assert_eq!(after.withdrawn, dec!(50.25));

    // 按处理时间正序
    let listed: Vec<String> = withdrawals
        .list_by_user(user.id)
        .await
        .unwrap()
        .into_iter()
        .map(|w| w.number)
        .collect();
    assert_eq!(listed, vec![first, second]);
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_concurrent_withdrawals_never_overdraw() {
    let pool = common::test_pool().await;
    let user = common::create_user(&pool).await;
    let orders = OrderRepository::new(pool.clone());
    let number = common::next_order_number();
    orders.insert_new(&number, user.id).await.unwrap();
    orders
        .settle(&number, OrderStatus::Processed, Some(dec!(100)))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let repo = WithdrawalRepository::new(pool.clone());
        let user_id = user.id;
        handles.push(tokio::spawn(async move {
            repo.create_if_covered(user_id, &common::next_order_number(), dec!(40))
                .await
                .unwrap()
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        if matches!(handle.await.unwrap(), WithdrawalOutcome::Accepted(_)) {
            accepted += 1;
        }
    }

    assert_eq!(accepted, 2);
    let withdrawn = WithdrawalRepository::new(pool.clone())
        .sum_withdrawn(user.id)
        .await
        .unwrap();
    assert_eq!(withdrawn, dec!(80));
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_poller_settles_orders_from_mock_accrual() {
    let pool = common::test_pool().await;
    let user = common::create_user(&pool).await;
    let orders = OrderRepository::new(pool.clone());

    let processed = common::next_order_number();
    let invalid = common::next_order_number();
    let unknown = common::next_order_number();
    for number in [&processed, &invalid, &unknown] {
        orders.insert_new(number, user.id).await.unwrap();
    }

    let state = Arc::new(AccrualServiceState::new(
        FixedWindowLimiter::new(0, Duration::from_secs(60)),
        false,
    ));
    state
        .store
        .upsert(AccrualRecord::processed(&processed, dec!(42.5)));
    state.store.upsert(AccrualRecord {
        order: invalid.clone(),
        status: mock_accrual::MockAccrualStatus::Invalid,
        accrual: None,
    });
    let address = common::spawn_server(accrual_routes().with_state(state)).await;

    let config = AccrualConfig {
        address,
        ..AccrualConfig::default()
    };
    let mut poller = AccrualPoller::new(
        Arc::new(orders.clone()),
        Arc::new(HttpAccrualClient::new(&config).unwrap()),
        &config,
    );
    let (_tx, rx) = watch::channel(false);

    let outcome = poller.poll_once(&rx).await;
    assert!(matches!(outcome, BatchOutcome::Completed { settled, .. } if settled >= 2));

    let settled = orders.find_by_number(&processed).await.unwrap().unwrap();
    assert_eq!(settled.status, OrderStatus::Processed);
    assert_eq!(settled.accrual, Some(dec!(42.5)));

    let rejected = orders.find_by_number(&invalid).await.unwrap().unwrap();
    assert_eq!(rejected.status, OrderStatus::Invalid);
    assert_eq!(rejected.accrual, None);

    let untouched = orders.find_by_number(&unknown).await.unwrap().unwrap();
    assert_eq!(untouched.status, OrderStatus::New);

    assert_eq!(
        orders.sum_processed_accrual(user.id).await.unwrap(),
        dec!(42.5)
    );
}
