use axum::{Router, routing::post};

use crate::AppState;

mod handler;
mod model;

pub use handler::{ask, feedback, practice_exam, study_plan, summarize, tutor};

/// AI 辅导路由表，main 和集成测试共用
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ai/ask", post(handler::ask))
        .route("/ai/tutor", post(handler::tutor))
        .route("/ai/plan", post(handler::study_plan))
        .route("/ai/exam", post(handler::practice_exam))
        .route("/ai/summarize", post(handler::summarize))
        .route("/ai/feedback", post(handler::feedback))
}
