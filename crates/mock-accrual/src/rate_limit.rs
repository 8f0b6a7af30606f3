//! 固定窗口限流
//!
//! 每个窗口内最多放行 `max_requests` 个请求，超出部分返回剩余等待时间。

use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// 限流判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// 需等待到当前窗口结束
    Limited { retry_after: Duration },
}

#[derive(Debug)]
struct Window {
    started_at: Instant,
    used: u32,
}

/// 固定窗口限流器，`max_requests = 0` 表示不限流
#[derive(Debug)]
pub struct FixedWindowLimiter {
    max_requests: u32,
    window: Duration,
    state: Mutex<Window>,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Mutex::new(Window {
                started_at: Instant::now(),
                used: 0,
            }),
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn check(&self) -> Admission {
        self.check_at(Instant::now())
    }

    fn check_at(&self, now: Instant) -> Admission {
        if self.max_requests == 0 {
            return Admission::Allowed;
        }

        let mut state = self.state.lock();
        let elapsed = now.saturating_duration_since(state.started_at);
        if elapsed >= self.window {
            state.started_at = now;
            state.used = 0;
        }

        if state.used < self.max_requests {
            state.used += 1;
            Admission::Allowed
        } else {
            let remaining = self.window.saturating_sub(elapsed.min(self.window));
            Admission::Limited {
                retry_after: remaining,
            }
        }
    }
}
