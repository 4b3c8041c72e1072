use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use super::{RateDecision, RateLimitStore};

/// Redis 版固定窗口计数器，多实例部署时共享配额
///
/// 键为 `rate_limit:{identity}`，INCR 自增后在首笔请求上设置过期，
/// 原子性由 Redis 服务端保证。Redis 不可用时放行请求：限流组件
/// degrade 不应连带切断 AI 调用链路。
pub struct RedisRateLimitStore {
    client: redis::Client,
    max_requests: u32,
    window: Duration,
}

impl RedisRateLimitStore {
    pub fn new(client: redis::Client, max_requests: u32, window: Duration) -> Self {
        Self {
            client,
            max_requests,
            window,
        }
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn check_and_consume(&self, identity: &str) -> RateDecision {
        let key = format!("rate_limit:{}", identity);

        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!("Redis connection failed, skipping rate limit check: {}", e);
                return RateDecision::Allowed;
            }
        };

        let count: i32 = match conn.incr(&key, 1).await {
            Ok(count) => count,
            Err(e) => {
                tracing::error!("Redis INCR failed, skipping rate limit check: {}", e);
                return RateDecision::Allowed;
            }
        };

        // 窗口首笔请求负责设置过期时间
        if count == 1 {
            let expired: Result<(), _> = conn.expire(&key, self.window.as_secs() as i64).await;
            if let Err(e) = expired {
                tracing::error!("Redis EXPIRE failed for {}: {}", key, e);
            }
        }

        if count > self.max_requests as i32 {
            RateDecision::Exceeded {
                retry_after_secs: self.window.as_secs(),
            }
        } else {
            RateDecision::Allowed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_redis_fails_open() {
        // 端口 1 上没有服务，连接立刻被拒
        let client = redis::Client::open("redis://127.0.0.1:1/").unwrap();
        let store = RedisRateLimitStore::new(client, 10, Duration::from_secs(60));

        assert_eq!(store.check_and_consume("1.2.3.4").await, RateDecision::Allowed);
    }
}
