//! 可复用的重试策略
//!
//! 各路由共用这一个高阶函数，不再各自手写"试 3 次、睡 2s/4s"的循环。
//! 是否重试由传入的判定函数决定，退避时长由传入的退避函数决定。

use std::future::Future;
use std::time::Duration;

use crate::error::GatewayError;

/// 生产退避曲线：第 n 次失败后睡 n * 2 秒（3 次封顶时即 2s、4s）
pub fn linear_backoff(attempt: u32) -> Duration {
    Duration::from_secs(u64::from(attempt) * 2)
}

/// 对一个异步操作做有界重试
///
/// 尝试次数从 1 计起，第 1 次无条件执行。失败后先问 `is_transient`：
/// 非瞬时错误立即原样抛出；瞬时错误且还有剩余次数时睡 `backoff(attempt)`
/// 再试，次数耗尽后抛出最后一次的错误。
pub async fn with_retry<T, F, Fut, P, B>(
    operation: F,
    max_attempts: u32,
    is_transient: P,
    backoff: B,
) -> Result<T, GatewayError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
    P: Fn(&GatewayError) -> bool,
    B: Fn(u32) -> Duration,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_transient(&err) || attempt >= max_attempts {
                    return Err(err);
                }
                let delay = backoff(attempt);
                tracing::warn!(
                    "Transient provider failure on attempt {}/{}, retrying in {:?}: {}",
                    attempt,
                    max_attempts,
                    delay,
                    err
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
