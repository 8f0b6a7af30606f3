//! 积分计算系统集成
//!
//! - `client`: 查询单个订单积分状态的 HTTP 客户端
//! - `schedule`: 轮询节奏（基础间隔、限流后的放宽间隔、下次可执行时间）
//! - `poller`: 后台轮询任务，推进待处理订单的状态

pub mod client;
pub mod poller;
pub mod schedule;

pub use client::{AccrualClient, AccrualError, AccrualReply, AccrualResponse, HttpAccrualClient};
pub use poller::{AccrualPoller, BatchOutcome};
pub use schedule::PollSchedule;
