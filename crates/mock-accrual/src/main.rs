//! Mock 积分系统入口

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use mock_accrual::{AccrualServiceState, FixedWindowLimiter, accrual_routes};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "mock-accrual", version, about = "本地开发用的 Mock 积分计算系统")]
struct Cli {
    /// 监听地址
    #[arg(short = 'a', long, env = "MOCK_ACCRUAL_ADDRESS", default_value = "0.0.0.0:8081")]
    address: String,

    /// 每个窗口允许的请求数，0 表示不限流
    #[arg(long, env = "MOCK_ACCRUAL_RATE_LIMIT", default_value_t = 0)]
    rate_limit: u32,

    /// 限流窗口（秒）
    #[arg(long, default_value_t = 60)]
    window_secs: u64,

    /// 未登记订单自动登记并逐步推进到 PROCESSED
    #[arg(long)]
    auto_progress: bool,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 优先使用 RUST_LOG，否则使用命令行指定的级别
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .init();

    let state = Arc::new(AccrualServiceState::new(
        FixedWindowLimiter::new(cli.rate_limit, Duration::from_secs(cli.window_secs)),
        cli.auto_progress,
    ));
    let app = accrual_routes().with_state(state);

    let listener = TcpListener::bind(&cli.address).await?;
    info!(
        address = %cli.address,
        rate_limit = cli.rate_limit,
        auto_progress = cli.auto_progress,
        "Mock accrual server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received Ctrl+C, shutting down");
        })
        .await?;

    Ok(())
}
