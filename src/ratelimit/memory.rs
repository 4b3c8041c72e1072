use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::{RateDecision, RateLimitStore};

/// 单个身份在当前窗口内的计数
#[derive(Debug)]
struct RateWindow {
    count: u32,
    reset_at: Instant,
}

/// 进程内存版固定窗口计数器
///
/// 没配 REDIS_URL 时的默认实现。整张表压在一把互斥锁下，
/// 锁内只有哈希查找和整数运算，不跨 await 持锁。
pub struct MemoryRateLimitStore {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, RateWindow>>,
}

impl MemoryRateLimitStore {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// 清掉已过期的窗口，防止身份数无限增长
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.windows
            .lock()
            .unwrap()
            .retain(|_, window| now <= window.reset_at);
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn check_and_consume(&self, identity: &str) -> RateDecision {
        let mut windows = self.windows.lock().unwrap();
        let now = Instant::now();

        let window = windows.entry(identity.to_string()).or_insert(RateWindow {
            count: 0,
            reset_at: now + self.window,
        });

        // 过期的窗口重开，本次请求落入新窗口
        if now > window.reset_at {
            window.count = 0;
            window.reset_at = now + self.window;
        }

        if window.count >= self.max_requests {
            // 拒绝不消耗配额
            return RateDecision::Exceeded {
                retry_after_secs: self.window.as_secs(),
            };
        }

        window.count += 1;
        RateDecision::Allowed
    }
}
