use crate::config::Config;
use crate::error::GatewayError;

use super::types::{GenerateContentRequest, GenerateContentResponse, ProviderErrorResponse};

/// 生成式文本服务商客户端
///
/// 每次 `generate` 只发一个 POST，不在这一层重试；
/// 重试由上层用 `retry::with_retry` 按路由组合。
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Self {
        // 超时兜底：服务商挂起时不能无限占着请求任务
        let http = reqwest::Client::builder()
            .timeout(config.provider_timeout())
            .build()
            .expect("Failed to build provider HTTP client");

        Self {
            http,
            base_url: config.provider_base_url.trim_end_matches('/').to_string(),
            model: config.provider_model.clone(),
            api_key: config.provider_api_key.clone(),
        }
    }

    /// 调一次 generateContent 并取出生成文本
    ///
    /// 凭据在调用时检查而不是构造时：允许服务在未配置凭据的情况下
    /// 启动，按请求返回"未配置"。
    pub async fn generate(&self, prompt: &str) -> Result<String, GatewayError> {
        let api_key = self.api_key.as_deref().ok_or(GatewayError::Configuration)?;

        // 注意 key 在查询串里，这个 URL 不能进日志
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        );

        let response = self
            .http
            .post(&url)
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderErrorResponse>(&body)
                .ok()
                .and_then(|parsed| parsed.error)
                .and_then(|detail| detail.message)
                .unwrap_or(body);
            tracing::warn!(
                "Provider rejected request: model={} status={} message={}",
                self.model,
                status,
                message
            );
            return Err(GatewayError::ProviderRejected {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: GenerateContentResponse = response.json().await.map_err(|e| {
            tracing::warn!("Provider returned undecodable 2xx body: {}", e);
            GatewayError::EmptyResponse
        })?;

        match envelope.first_text() {
            Some(text) => Ok(text.to_string()),
            None => Err(GatewayError::EmptyResponse),
        }
    }
}
