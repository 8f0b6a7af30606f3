//! 积分（loyalty）服务
//!
//! 用户上传订单号，后台任务向外部积分计算系统轮询订单状态并记入积分，
//! 用户可查询余额并用积分提现。
//!
//! ## 模块结构
//!
//! - `models`: 订单、提现、用户、余额等领域模型
//! - `repository`: PostgreSQL 仓储及其 trait
//! - `service`: 订单上传、余额计算、提现、注册登录
//! - `accrual`: 积分系统客户端与后台轮询任务
//! - `auth` / `middleware`: JWT 签发与认证
//! - `handlers` / `routes` / `state`: HTTP 层

pub mod accrual;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod service;
pub mod state;

pub use error::{LoyaltyError, Result};
pub use models::{AccrualStatus, Balance, Order, OrderStatus, User, Withdrawal};

/// 内嵌的数据库迁移脚本
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
