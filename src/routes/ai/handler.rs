use axum::{
    Json,
    extract::State,
    http::header::RETRY_AFTER,
    response::{IntoResponse, Response},
};

use super::model::{
    AskRequest, AskResponse, FeedbackRequest, FeedbackResponse, PracticeExamRequest,
    PracticeExamResponse, StudyPlanRequest, StudyPlanResponse, SummarizeRequest,
    SummarizeResponse, TutorEnvelope, TutorRequest,
};
use crate::AppState;
use crate::error::GatewayError;
use crate::middleware::ClientIdentity;

#[axum::debug_handler]
pub async fn ask(
    State(state): State<AppState>,
    identity: ClientIdentity,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, GatewayError> {
    let reply = state.gateway.ask(&identity, &req.prompt).await?;
    Ok(Json(AskResponse { reply }))
}

/// 其余路由用裸 `{"error": ...}` 信封报错，辅导路由保留
/// success 标记，错误时也返回对应状态码和 Retry-After 头。
#[axum::debug_handler]
pub async fn tutor(
    State(state): State<AppState>,
    identity: ClientIdentity,
    Json(req): Json<TutorRequest>,
) -> Response {
    match state
        .gateway
        .tutor(&identity, &req.question, req.context.as_deref())
        .await
    {
        Ok(answer) => Json(TutorEnvelope::success(answer)).into_response(),
        Err(err) => {
            let status = err.status();
            let retry_after = err.retry_after_hint();
            let mut response =
                (status, Json(TutorEnvelope::failure(err.user_message()))).into_response();
            if let Some(secs) = retry_after {
                if let Ok(value) = secs.to_string().parse() {
                    response.headers_mut().insert(RETRY_AFTER, value);
                }
            }
            response
        }
    }
}

#[axum::debug_handler]
pub async fn study_plan(
    State(state): State<AppState>,
    identity: ClientIdentity,
    Json(req): Json<StudyPlanRequest>,
) -> Result<Json<StudyPlanResponse>, GatewayError> {
    let plan = state
        .gateway
        .study_plan(&identity, &req.subject, &req.goal, req.days, req.hours_per_day)
        .await?;
    Ok(Json(StudyPlanResponse { plan }))
}

#[axum::debug_handler]
pub async fn practice_exam(
    State(state): State<AppState>,
    identity: ClientIdentity,
    Json(req): Json<PracticeExamRequest>,
) -> Result<Json<PracticeExamResponse>, GatewayError> {
    let questions = state
        .gateway
        .practice_exam(
            &identity,
            &req.subject,
            &req.topic,
            req.count,
            req.difficulty.as_deref(),
        )
        .await?;
    Ok(Json(PracticeExamResponse { questions }))
}

#[axum::debug_handler]
pub async fn summarize(
    State(state): State<AppState>,
    identity: ClientIdentity,
    Json(req): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, GatewayError> {
    let summary = state
        .gateway
        .summarize(&identity, &req.text, req.length.as_deref())
        .await?;
    Ok(Json(SummarizeResponse { summary }))
}

#[axum::debug_handler]
pub async fn feedback(
    State(state): State<AppState>,
    identity: ClientIdentity,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, GatewayError> {
    let feedback = state
        .gateway
        .feedback(&identity, &req.question, &req.answer, req.subject.as_deref())
        .await?;
    Ok(Json(FeedbackResponse { feedback }))
}
