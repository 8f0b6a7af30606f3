//! 积分服务入口
//!
//! 启动 HTTP API 与积分轮询后台任务，收到 SIGTERM / Ctrl+C 时优雅退出。

use std::sync::Arc;

use anyhow::Context;
use axum::{Json, middleware, routing::get};
use clap::Parser;
use loyalty_service::{
    MIGRATOR,
    accrual::{AccrualPoller, HttpAccrualClient},
    auth::{JwtConfig, JwtManager},
    repository::OrderRepository,
    routes,
    state::AppState,
};
use loyalty_shared::{
    config::{AppConfig, AuthConfig},
    database::Database,
    error::SharedError,
    observability::{self, middleware as obs_middleware},
    retry::{RetryPolicy, retry_with_policy},
};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::compression::CompressionLayer;
use tracing::{error, info, warn};

const SERVICE_NAME: &str = "loyalty-service";

/// 命令行参数，优先级高于配置文件和 LOYALTY_* 环境变量
#[derive(Debug, Parser)]
#[command(name = "loyalty", version, about = "积分服务")]
struct Cli {
    /// HTTP 服务监听地址（host:port）
    #[arg(short = 'a', long = "address", env = "RUN_ADDRESS")]
    run_address: Option<String>,

    /// PostgreSQL 连接串
    #[arg(short = 'd', long = "database-uri", env = "DATABASE_URI")]
    database_uri: Option<String>,

    /// 积分计算系统地址
    #[arg(short = 'r', long = "accrual-address", env = "ACCRUAL_SYSTEM_ADDRESS")]
    accrual_address: Option<String>,
}

impl Cli {
    fn apply(self, config: &mut AppConfig) -> anyhow::Result<()> {
        if let Some(address) = self.run_address {
            let (host, port) = address
                .rsplit_once(':')
                .with_context(|| format!("监听地址格式应为 host:port: {}", address))?;
            config.server.host = if host.is_empty() { "0.0.0.0" } else { host }.to_string();
            config.server.port = port
                .parse()
                .with_context(|| format!("无效的端口: {}", port))?;
        }
        if let Some(uri) = self.database_uri {
            config.database.url = uri;
        }
        if let Some(address) = self.accrual_address {
            config.accrual.address = address;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 先加载配置（会读取 .env），再解析命令行，保证 .env 中的 RUN_ADDRESS 等也生效
    let mut config = AppConfig::load(SERVICE_NAME).context("加载配置失败")?;
    Cli::parse().apply(&mut config)?;

    let _guard = observability::init(&config.service_name, &config.observability).await?;

    info!("Starting {} on {}", config.service_name, config.server_addr());

    if config.auth.jwt_secret == AuthConfig::default().jwt_secret {
        if config.is_production() {
            anyhow::bail!("生产环境必须通过 LOYALTY_AUTH__JWT_SECRET 设置 JWT 密钥");
        }
        warn!("Using default JWT secret - set LOYALTY_AUTH__JWT_SECRET for production");
    }

    // 数据库可能晚于服务启动就绪，连接失败按退避重试
    let db = retry_with_policy(
        &RetryPolicy::default(),
        "database_connect",
        SharedError::is_retryable,
        || Database::connect(&config.database),
    )
    .await?;
    if config.database.run_migrations {
        db.run_migrations(&MIGRATOR).await?;
    }

    let state = AppState::new(
        db.pool().clone(),
        JwtManager::new(JwtConfig::from(&config.auth)),
    );

    // 积分轮询任务与 HTTP 服务共用连接池
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let accrual_client = HttpAccrualClient::new(&config.accrual)?;
    let poller = AccrualPoller::new(
        Arc::new(OrderRepository::new(db.pool().clone())),
        Arc::new(accrual_client),
        &config.accrual,
    );
    info!(accrual = %config.accrual.base_url(), "积分轮询任务启动");
    let poller_handle = tokio::spawn(poller.run(shutdown_rx));

    let app = routes::app(state)
        .route("/health", get(health_check))
        .route(
            "/ready",
            get({
                let db_for_ready = db.clone();
                move || readiness_check(db_for_ready.clone())
            }),
        )
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id));

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // HTTP 已停止接收请求，通知轮询任务在当前订单处理完后退出
    let _ = shutdown_tx.send(true);
    if let Err(e) = poller_handle.await {
        error!(error = %e, "积分轮询任务异常退出");
    }

    db.close().await;
    info!("Server shutdown complete");

    Ok(())
}

/// 监听关闭信号
///
/// 收到 SIGTERM 或 Ctrl+C 后返回，触发 axum 的优雅关闭流程。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "注册 Ctrl+C 处理器失败");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "注册 SIGTERM 处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}

/// 存活探针
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": SERVICE_NAME
    }))
}

/// 就绪探针：检查数据库连接
async fn readiness_check(db: Database) -> Json<serde_json::Value> {
    let database = match db.ping().await {
        Ok(latency) => serde_json::json!({
            "status": "ok",
            "latency_ms": latency.as_millis() as u64
        }),
        Err(e) => {
            warn!(error = %e, "就绪检查：数据库不可用");
            serde_json::json!({ "status": "fail" })
        }
    };
    let ready = database["status"] == "ok";

    Json(serde_json::json!({
        "status": if ready { "ok" } else { "degraded" },
        "service": SERVICE_NAME,
        "checks": { "database": database }
    }))
}
