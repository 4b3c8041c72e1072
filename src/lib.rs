use std::sync::Arc;

use config::Config;
use gateway::TutoringGateway;
use provider::GeminiClient;
use ratelimit::{MemoryRateLimitStore, RateLimitStore, RedisRateLimitStore};

pub mod config;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod prompt;
pub mod provider;
pub mod ratelimit;
pub mod retry;
pub mod routes;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub gateway: TutoringGateway,
}

impl AppState {
    /// 按配置装配网关：配了 REDIS_URL 用 Redis 计数器，否则进程内存
    pub fn new(config: Config) -> Self {
        let limiter: Arc<dyn RateLimitStore> = match &config.redis_url {
            Some(url) => match redis::Client::open(url.as_str()) {
                Ok(client) => Arc::new(RedisRateLimitStore::new(
                    client,
                    config.rate_limit_requests,
                    config.rate_limit_window(),
                )),
                Err(e) => {
                    tracing::warn!(
                        "Invalid REDIS_URL, falling back to in-memory rate limiting: {}",
                        e
                    );
                    Arc::new(MemoryRateLimitStore::new(
                        config.rate_limit_requests,
                        config.rate_limit_window(),
                    ))
                }
            },
            None => Arc::new(MemoryRateLimitStore::new(
                config.rate_limit_requests,
                config.rate_limit_window(),
            )),
        };

        let provider = GeminiClient::new(&config);
        let gateway = TutoringGateway::new(provider, limiter, config.ai_retry_attempts);

        AppState { config, gateway }
    }
}
