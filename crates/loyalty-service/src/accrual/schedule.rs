//! 轮询节奏
//!
//! 限流（429）不会替换定时器，而是修改调度状态：
//! 放宽轮询间隔，并把下次可执行时间推迟到 Retry-After 之后。

use std::time::Duration;

use tokio::time::Instant;

/// 单次限流等待的上限，超出的 Retry-After 按此截断
pub const MAX_BACKOFF: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct PollSchedule {
    base_interval: Duration,
    interval: Duration,
    next_eligible: Instant,
}

impl PollSchedule {
    /// 新建调度，第一轮立即可执行
    pub fn new(base_interval: Duration) -> Self {
        Self {
            base_interval,
            interval: base_interval,
            next_eligible: Instant::now(),
        }
    }

    pub fn base_interval(&self) -> Duration {
        self.base_interval
    }

    /// 当前轮询间隔（可能已因限流放宽）
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn next_eligible(&self) -> Instant {
        self.next_eligible
    }

    /// 距下次可执行还需等待的时间
    pub fn until_next(&self, now: Instant) -> Duration {
        self.next_eligible.saturating_duration_since(now)
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_eligible
    }

    /// 记录一轮开始，下一轮在 start + interval 之后
    pub fn begin_tick(&mut self, start: Instant) {
        self.next_eligible = start.checked_add(self.interval).unwrap_or(start);
    }

    /// 收到限流：间隔放宽到不小于 wait，下一轮不早于 now + wait
    ///
    /// wait 超过 [`MAX_BACKOFF`] 时截断，返回实际生效的等待时间。
    pub fn apply_backpressure(&mut self, now: Instant, wait: Duration) -> Duration {
        let wait = wait.min(MAX_BACKOFF);
        self.interval = self.interval.max(wait);
        self.next_eligible = now.checked_add(wait).unwrap_or(now);
        wait
    }
}
