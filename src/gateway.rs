//! 六个 AI 操作的编排层
//!
//! 每个操作走同一条流水线：校验输入 → 限流闸门 → 拼 prompt 调
//! 服务商 → 整理输出。长耗时任务（plan / exam / summarize /
//! feedback）对瞬时故障做线性退避重试，会话式任务（ask / tutor）
//! 为了响应速度只调一次。

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GatewayError;
use crate::middleware::ClientIdentity;
use crate::prompt;
use crate::provider::GeminiClient;
use crate::ratelimit::{RateDecision, RateLimitStore};
use crate::retry::{linear_backoff, with_retry};
use crate::utils::{log_preview, strip_code_fence};

/// 输入上限（字符数）
pub const MAX_PROMPT_CHARS: usize = 2000;
pub const MAX_FIELD_CHARS: usize = 200;
pub const MAX_ANSWER_CHARS: usize = 8000;
pub const MAX_SUMMARY_TEXT_CHARS: usize = 20_000;

pub const MAX_PLAN_DAYS: u32 = 60;
pub const MAX_EXAM_QUESTIONS: u32 = 20;
pub const DEFAULT_EXAM_QUESTIONS: u32 = 5;

/// 服务商调用失败时 feedback 路由的兜底文案
pub const FEEDBACK_FALLBACK: &str = "这次作答的思路值得肯定。建议对照教材再核对一遍关键概念，\
并尝试用自己的话把推理过程完整写出来，这样更容易发现薄弱环节。";

/// 学习计划中的一天
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDay {
    pub day: u32,
    pub focus: String,
    pub tasks: Vec<String>,
}

/// 模拟测验中的一道选择题
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
    pub explanation: String,
}

/// 辅导路由的应答载荷
#[derive(Debug, Clone, Serialize)]
pub struct TutorAnswer {
    pub question: String,
    pub answer: String,
    /// RFC3339 格式的应答时间
    pub timestamp: String,
}

/// AI 辅导网关：服务商客户端 + 限流计数器 + 重试策略
#[derive(Clone)]
pub struct TutoringGateway {
    provider: GeminiClient,
    limiter: Arc<dyn RateLimitStore>,
    retry_attempts: u32,
}

impl TutoringGateway {
    pub fn new(
        provider: GeminiClient,
        limiter: Arc<dyn RateLimitStore>,
        retry_attempts: u32,
    ) -> Self {
        Self {
            provider,
            limiter,
            retry_attempts,
        }
    }

    /// 自由问答：prompt 原样透传给服务商
    pub async fn ask(
        &self,
        identity: &ClientIdentity,
        prompt: &str,
    ) -> Result<String, GatewayError> {
        require_text(prompt, "提问内容", MAX_PROMPT_CHARS)?;
        self.guard(identity).await?;

        let request_id = Uuid::new_v4();
        tracing::info!("[{}] ask from {}: {}", request_id, identity, log_preview(prompt, 80));

        let reply = self.provider.generate(prompt).await?;

        tracing::info!("[{}] ask answered, {} chars", request_id, reply.chars().count());
        Ok(reply)
    }

    /// 辅导问答：套用辅导人设模板，带可选科目上下文
    pub async fn tutor(
        &self,
        identity: &ClientIdentity,
        question: &str,
        context: Option<&str>,
    ) -> Result<TutorAnswer, GatewayError> {
        require_text(question, "问题", MAX_PROMPT_CHARS)?;
        if let Some(context) = context {
            require_within(context, "科目上下文", MAX_FIELD_CHARS)?;
        }
        self.guard(identity).await?;

        let request_id = Uuid::new_v4();
        tracing::info!(
            "[{}] tutor from {}: {}",
            request_id,
            identity,
            log_preview(question, 80)
        );

        let prompt = prompt::format_tutor_prompt(question, context);
        let answer = self.provider.generate(&prompt).await?;

        tracing::info!("[{}] tutor answered, {} chars", request_id, answer.chars().count());
        Ok(TutorAnswer {
            question: question.to_string(),
            answer,
            timestamp: Utc::now().to_rfc3339(),
        })
    }

    /// 生成逐天学习计划，模型输出按严格 JSON 解析
    pub async fn study_plan(
        &self,
        identity: &ClientIdentity,
        subject: &str,
        goal: &str,
        days: u32,
        hours_per_day: Option<f32>,
    ) -> Result<Vec<PlanDay>, GatewayError> {
        require_text(subject, "学科", MAX_FIELD_CHARS)?;
        require_text(goal, "学习目标", MAX_FIELD_CHARS)?;
        if !(1..=MAX_PLAN_DAYS).contains(&days) {
            return Err(GatewayError::InvalidInput(format!(
                "计划天数必须在1-{}之间",
                MAX_PLAN_DAYS
            )));
        }
        if let Some(hours) = hours_per_day {
            if !hours.is_finite() || hours <= 0.0 || hours > 24.0 {
                return Err(GatewayError::InvalidInput(
                    "每日学习时长必须在0-24小时之间".to_string(),
                ));
            }
        }
        self.guard(identity).await?;

        let request_id = Uuid::new_v4();
        tracing::info!(
            "[{}] plan from {}: subject={} days={}",
            request_id,
            identity,
            log_preview(subject, 40),
            days
        );

        let prompt = prompt::study_plan_prompt(subject, goal, days, hours_per_day);
        let raw = self.generate_with_retry(&prompt).await?;
        let plan: Vec<PlanDay> = parse_structured(&raw, "study plan")?;
        if plan.is_empty() {
            return Err(GatewayError::EmptyResponse);
        }

        tracing::info!("[{}] plan generated, {} days", request_id, plan.len());
        Ok(plan)
    }

    /// 生成模拟测验，count 缺省 5 道，difficulty 缺省 medium
    pub async fn practice_exam(
        &self,
        identity: &ClientIdentity,
        subject: &str,
        topic: &str,
        count: Option<u32>,
        difficulty: Option<&str>,
    ) -> Result<Vec<ExamQuestion>, GatewayError> {
        require_text(subject, "学科", MAX_FIELD_CHARS)?;
        require_text(topic, "考察主题", MAX_FIELD_CHARS)?;
        let count = count.unwrap_or(DEFAULT_EXAM_QUESTIONS);
        if !(1..=MAX_EXAM_QUESTIONS).contains(&count) {
            return Err(GatewayError::InvalidInput(format!(
                "题目数量必须在1-{}之间",
                MAX_EXAM_QUESTIONS
            )));
        }
        let difficulty = difficulty.unwrap_or("medium");
        self.guard(identity).await?;

        let request_id = Uuid::new_v4();
        tracing::info!(
            "[{}] exam from {}: topic={} count={}",
            request_id,
            identity,
            log_preview(topic, 40),
            count
        );

        let prompt = prompt::practice_exam_prompt(subject, topic, count, difficulty);
        let raw = self.generate_with_retry(&prompt).await?;
        let questions: Vec<ExamQuestion> = parse_structured(&raw, "practice exam")?;
        if questions.is_empty() {
            return Err(GatewayError::EmptyResponse);
        }

        tracing::info!("[{}] exam generated, {} questions", request_id, questions.len());
        Ok(questions)
    }

    /// 摘要学习材料，length 档位 short / detailed，其余按默认处理
    pub async fn summarize(
        &self,
        identity: &ClientIdentity,
        text: &str,
        length: Option<&str>,
    ) -> Result<String, GatewayError> {
        require_text(text, "待总结文本", MAX_SUMMARY_TEXT_CHARS)?;
        self.guard(identity).await?;

        let request_id = Uuid::new_v4();
        tracing::info!(
            "[{}] summarize from {}: {} chars of material",
            request_id,
            identity,
            text.chars().count()
        );

        let prompt = prompt::summary_prompt(text, length.unwrap_or("medium"));
        let summary = self.generate_with_retry(&prompt).await?;

        tracing::info!("[{}] summary generated, {} chars", request_id, summary.chars().count());
        Ok(summary)
    }

    /// 点评学生作答。服务商侧失败时降级为固定文案，凭据未配置
    /// 和输入问题照常报错。
    pub async fn feedback(
        &self,
        identity: &ClientIdentity,
        question: &str,
        answer: &str,
        subject: Option<&str>,
    ) -> Result<String, GatewayError> {
        require_text(question, "问题", MAX_PROMPT_CHARS)?;
        require_text(answer, "作答内容", MAX_ANSWER_CHARS)?;
        if let Some(subject) = subject {
            require_within(subject, "学科", MAX_FIELD_CHARS)?;
        }
        self.guard(identity).await?;

        let request_id = Uuid::new_v4();
        tracing::info!(
            "[{}] feedback from {}: {}",
            request_id,
            identity,
            log_preview(question, 80)
        );

        let prompt = prompt::feedback_prompt(question, answer, subject);
        match self.generate_with_retry(&prompt).await {
            Ok(feedback) => {
                tracing::info!("[{}] feedback generated", request_id);
                Ok(feedback)
            }
            Err(err) if err.is_provider_failure() => {
                tracing::warn!("[{}] feedback fell back to canned text: {}", request_id, err);
                Ok(FEEDBACK_FALLBACK.to_string())
            }
            Err(err) => Err(err),
        }
    }

    /// 限流闸门，所有操作在校验通过后、调服务商前经过这里
    async fn guard(&self, identity: &ClientIdentity) -> Result<(), GatewayError> {
        match self.limiter.check_and_consume(identity.as_str()).await {
            RateDecision::Allowed => Ok(()),
            RateDecision::Exceeded { retry_after_secs } => {
                tracing::warn!("Rate limit exceeded for {}", identity);
                Err(GatewayError::RateLimited { retry_after_secs })
            }
        }
    }

    /// 长耗时任务的调用路径：瞬时故障按线性退避重试
    async fn generate_with_retry(&self, prompt: &str) -> Result<String, GatewayError> {
        with_retry(
            || self.provider.generate(prompt),
            self.retry_attempts,
            GatewayError::is_transient,
            linear_backoff,
        )
        .await
    }
}

/// 非空且不超长的文本字段校验
fn require_text(value: &str, label: &str, max_chars: usize) -> Result<(), GatewayError> {
    if value.trim().is_empty() {
        return Err(GatewayError::InvalidInput(format!("{}不能为空", label)));
    }
    require_within(value, label, max_chars)
}

/// 只查长度，允许为空（可选字段用）
fn require_within(value: &str, label: &str, max_chars: usize) -> Result<(), GatewayError> {
    if value.chars().count() > max_chars {
        return Err(GatewayError::InvalidInput(format!(
            "{}长度不能超过{}个字符",
            label, max_chars
        )));
    }
    Ok(())
}

/// 剥掉可能的 Markdown 代码围栏后按 JSON 解析模型输出
fn parse_structured<T: DeserializeOwned>(raw: &str, what: &str) -> Result<T, GatewayError> {
    let json = strip_code_fence(raw);
    serde_json::from_str(json).map_err(|e| {
        tracing::warn!(
            "Unparseable {} from model: {} (raw: {})",
            what,
            e,
            log_preview(raw, 200)
        );
        GatewayError::EmptyResponse
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::config::Config;
    use crate::ratelimit::MemoryRateLimitStore;

    use super::*;

    fn test_config(api_key: Option<&str>) -> Config {
        Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            api_base_uri: "/api".to_string(),
            provider_api_key: api_key.map(String::from),
            // 端口 9 上没有服务，真发请求会立刻失败
            provider_base_url: "http://127.0.0.1:9".to_string(),
            provider_model: "gemini-2.0-flash".to_string(),
            provider_timeout_secs: 1,
            rate_limit_window_secs: 60,
            rate_limit_requests: 10,
            ai_retry_attempts: 1,
            redis_url: None,
        }
    }

    fn test_gateway(api_key: Option<&str>, rate_limit: u32) -> TutoringGateway {
        let config = test_config(api_key);
        TutoringGateway::new(
            GeminiClient::new(&config),
            Arc::new(MemoryRateLimitStore::new(rate_limit, Duration::from_secs(60))),
            1,
        )
    }

    fn identity() -> ClientIdentity {
        ClientIdentity::new("1.2.3.4")
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected_without_consuming_quota() {
        let gateway = test_gateway(None, 1);

        for _ in 0..3 {
            let err = gateway.ask(&identity(), "   ").await.unwrap_err();
            assert!(matches!(err, GatewayError::InvalidInput(_)));
        }
        // 配额没被无效请求吃掉，这次才走到凭据检查
        let err = gateway.ask(&identity(), "Explain gravity").await.unwrap_err();
        assert!(matches!(err, GatewayError::Configuration));
    }

    #[tokio::test]
    async fn oversized_prompt_is_rejected() {
        let gateway = test_gateway(None, 10);
        let long = "学".repeat(MAX_PROMPT_CHARS + 1);

        let err = gateway.ask(&identity(), &long).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn prompt_at_exact_ceiling_passes_validation() {
        let gateway = test_gateway(None, 10);
        let at_limit = "a".repeat(MAX_PROMPT_CHARS);

        // 校验通过后才撞上凭据缺失
        let err = gateway.ask(&identity(), &at_limit).await.unwrap_err();
        assert!(matches!(err, GatewayError::Configuration));
    }

    #[tokio::test]
    async fn missing_credential_maps_to_configuration() {
        let gateway = test_gateway(None, 10);

        let err = gateway
            .tutor(&identity(), "What is photosynthesis?", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Configuration));
    }

    #[tokio::test]
    async fn rate_limit_applies_before_provider_call() {
        let gateway = test_gateway(None, 1);

        // 第一笔过闸门后才发现凭据缺失，配额已消耗
        let first = gateway.ask(&identity(), "question one").await.unwrap_err();
        assert!(matches!(first, GatewayError::Configuration));

        let second = gateway.ask(&identity(), "question two").await.unwrap_err();
        assert!(matches!(second, GatewayError::RateLimited { retry_after_secs: 60 }));
    }

    #[tokio::test]
    async fn plan_day_range_is_validated() {
        let gateway = test_gateway(None, 10);

        for days in [0, MAX_PLAN_DAYS + 1] {
            let err = gateway
                .study_plan(&identity(), "Physics", "pass the exam", days, None)
                .await
                .unwrap_err();
            assert!(matches!(err, GatewayError::InvalidInput(_)), "days={}", days);
        }
    }

    #[tokio::test]
    async fn exam_count_range_is_validated() {
        let gateway = test_gateway(None, 10);

        let err = gateway
            .practice_exam(
                &identity(),
                "History",
                "French Revolution",
                Some(MAX_EXAM_QUESTIONS + 1),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput(_)));

        // 缺省题数落在合法范围内，校验后才碰到凭据缺失
        let err = gateway
            .practice_exam(&identity(), "History", "French Revolution", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Configuration));
    }

    #[tokio::test]
    async fn tutor_context_ceiling_is_enforced() {
        let gateway = test_gateway(None, 10);
        let context = "数".repeat(MAX_FIELD_CHARS + 1);

        let err = gateway
            .tutor(&identity(), "Explain derivatives", Some(&context))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn feedback_falls_back_when_provider_is_unreachable() {
        // 凭据在，但服务商地址不可达：网络故障属于服务商侧失败
        let gateway = test_gateway(Some("test-key"), 10);

        let feedback = gateway
            .feedback(&identity(), "Why is the sky blue?", "Because of the ocean", None)
            .await
            .unwrap();
        assert_eq!(feedback, FEEDBACK_FALLBACK);
    }

    #[tokio::test]
    async fn feedback_does_not_mask_missing_credential() {
        let gateway = test_gateway(None, 10);

        let err = gateway
            .feedback(&identity(), "Why is the sky blue?", "Rayleigh scattering", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Configuration));
    }

    #[test]
    fn structured_output_survives_code_fences() {
        let raw = "```json\n[{\"day\":1,\"focus\":\"Basics\",\"tasks\":[\"Read chapter 1\"]}]\n```";
        let plan: Vec<PlanDay> = parse_structured(raw, "study plan").unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].day, 1);
        assert_eq!(plan[0].tasks, vec!["Read chapter 1".to_string()]);
    }

    #[test]
    fn prose_model_output_is_an_empty_response() {
        let err = parse_structured::<Vec<PlanDay>>("I cannot produce JSON today.", "study plan")
            .unwrap_err();
        assert!(matches!(err, GatewayError::EmptyResponse));
    }
}
