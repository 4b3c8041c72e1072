use serde::{Deserialize, Serialize};

use crate::gateway::{ExamQuestion, PlanDay, TutorAnswer};

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub reply: String,
}

#[derive(Debug, Deserialize)]
pub struct TutorRequest {
    pub question: String,
    pub context: Option<String>,
}

/// 辅导路由沿用带 success 标记的应答信封
#[derive(Debug, Serialize)]
pub struct TutorEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<TutorAnswer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TutorEnvelope {
    pub fn success(data: TutorAnswer) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StudyPlanRequest {
    pub subject: String,
    pub goal: String,
    pub days: u32,
    pub hours_per_day: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct StudyPlanResponse {
    pub plan: Vec<PlanDay>,
}

#[derive(Debug, Deserialize)]
pub struct PracticeExamRequest {
    pub subject: String,
    pub topic: String,
    pub count: Option<u32>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PracticeExamResponse {
    pub questions: Vec<ExamQuestion>,
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub text: String,
    pub length: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub summary: String,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub question: String,
    pub answer: String,
    pub subject: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub feedback: String,
}
