use axum::Json;
use axum::{
    http::{StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// 网关统一错误分类
///
/// Display 文本面向日志，用户可见文案由 `user_message` 提供，
/// 不向调用方泄露服务商原始错误和凭据信息。
#[derive(Debug, Error)]
pub enum GatewayError {
    /// 请求体校验失败（为空、超长、数值越界）
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// 同一来源在窗口内的请求数已达上限
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// 服务商凭据未配置，重试无意义
    #[error("provider credential not configured")]
    Configuration,

    /// 服务商返回非 2xx，保留状态码和服务商报错原文
    #[error("provider rejected request: HTTP {status}: {message}")]
    ProviderRejected { status: u16, message: String },

    /// 服务商返回 2xx 但没有可用文本
    #[error("provider returned no usable text")]
    EmptyResponse,

    /// 到服务商的传输层故障
    #[error("network failure reaching provider: {0}")]
    Network(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl GatewayError {
    /// 该错误重试是否可能成功
    ///
    /// 服务商过载（HTTP 503 或报错文案出现 overloaded / temporarily
    /// unavailable）和传输层故障视为瞬时，其余一律不重试。
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::ProviderRejected { status, message } => {
                *status == 503 || {
                    let lower = message.to_lowercase();
                    lower.contains("overloaded") || lower.contains("temporarily unavailable")
                }
            }
            GatewayError::Network(_) => true,
            _ => false,
        }
    }

    /// 是否是服务商侧调用失败（feedback 路由降级分支的判定条件）
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            GatewayError::ProviderRejected { .. }
                | GatewayError::EmptyResponse
                | GatewayError::Network(_)
        )
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            GatewayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Configuration => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::ProviderRejected { .. }
            | GatewayError::EmptyResponse
            | GatewayError::Network(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// RateLimited 时 Retry-After 头携带的秒数
    pub fn retry_after_hint(&self) -> Option<u64> {
        match self {
            GatewayError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }

    /// 面向调用方的文案，服务商侧失败统一为一句通用提示
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::InvalidInput(msg) => msg.clone(),
            GatewayError::RateLimited { retry_after_secs } => {
                format!("请求过于频繁，请在{}秒后重试", retry_after_secs)
            }
            GatewayError::Configuration => "AI 服务未配置，请联系管理员".to_string(),
            GatewayError::ProviderRejected { .. }
            | GatewayError::EmptyResponse
            | GatewayError::Network(_) => "AI 服务暂时不可用，请稍后重试".to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorBody {
            error: self.user_message(),
        });

        let mut response = (status, body).into_response();
        if let Some(retry_after_secs) = self.retry_after_hint() {
            if let Ok(value) = retry_after_secs.to_string().parse() {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(
            GatewayError::ProviderRejected {
                status: 503,
                message: "Service Unavailable".into()
            }
            .is_transient()
        );
        assert!(
            GatewayError::ProviderRejected {
                status: 429,
                message: "The model is overloaded".into()
            }
            .is_transient()
        );
        assert!(
            GatewayError::ProviderRejected {
                status: 500,
                message: "temporarily unavailable, try again".into()
            }
            .is_transient()
        );
        assert!(GatewayError::Network("connection reset".into()).is_transient());

        assert!(!GatewayError::Configuration.is_transient());
        assert!(!GatewayError::EmptyResponse.is_transient());
        assert!(!GatewayError::InvalidInput("空".into()).is_transient());
        assert!(
            !GatewayError::ProviderRejected {
                status: 400,
                message: "invalid argument".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            GatewayError::InvalidInput("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::RateLimited {
                retry_after_secs: 60
            }
            .status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            GatewayError::Configuration.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            GatewayError::EmptyResponse.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GatewayError::Network("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn rate_limited_response_carries_retry_after_header() {
        let response = GatewayError::RateLimited {
            retry_after_secs: 60,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok()),
            Some("60")
        );
    }

    #[test]
    fn provider_detail_never_reaches_caller() {
        let err = GatewayError::ProviderRejected {
            status: 500,
            message: "secret internal detail".into(),
        };
        assert!(!err.user_message().contains("secret"));
    }
}
