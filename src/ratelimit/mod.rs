//! 按来源身份的固定窗口限流
//!
//! 计数存储抽象成接口注入网关：生产可用 Redis 计数器，
//! 测试和单机部署用进程内存实现，网关逻辑不感知差别。

mod memory;
mod redis;

pub use memory::MemoryRateLimitStore;
pub use self::redis::RedisRateLimitStore;

use async_trait::async_trait;

/// 一次限流判定的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    /// 已超限，附带建议等待秒数（固定为窗口长度）
    Exceeded { retry_after_secs: u64 },
}

impl RateDecision {
    pub fn is_exceeded(&self) -> bool {
        matches!(self, RateDecision::Exceeded { .. })
    }
}

/// 限流计数存储
///
/// `check_and_consume` 必须是不可分的原子单元：同一身份的并发请求
/// 不能都挤过阈值边界。各实现自己保证原子性（内存实现靠互斥锁，
/// Redis 实现靠服务端 INCR）。
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn check_and_consume(&self, identity: &str) -> RateDecision;
}
