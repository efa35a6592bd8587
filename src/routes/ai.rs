use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::mastery::InteractionInput;
use crate::models::user::{Role, User};
use crate::response::{json_error, SuccessResponse};
use crate::services::tutor::{GeneratedContent, PerformanceAnalysis};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct ChatRequest {
    message: String,
    subject: String,
    context: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatData {
    response: String,
    learning_rate: f64,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    topic: String,
    difficulty: Option<String>,
    content_type: Option<String>,
    target_audience: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedContentData {
    content: GeneratedContent,
    generated_at: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnalyzePerformanceRequest {
    subject: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisData {
    analysis: PerformanceAnalysis,
    analyzed_at: String,
}

pub async fn chat(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<ChatRequest>,
) -> Response {
    if payload.message.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "BAD_REQUEST", "Message is required")
            .into_response();
    }

    let profile = state.mastery().get_profile(&user.id).await;
    let learning_rate = profile.overall_rate;
    let history = state
        .mastery()
        .summarize_subject_history(&user.id, &payload.subject)
        .await;

    let reply = state
        .tutor()
        .chat_reply(
            &payload.message,
            &payload.subject,
            learning_rate,
            &history,
            payload.context.as_deref(),
        )
        .await;

    let reply = match reply {
        Ok(reply) => reply,
        Err(err) => {
            tracing::error!(error = %err, "AI chat failed");
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Failed to process AI request",
            )
            .into_response();
        }
    };

    // Asking the tutor counts as a doubt interaction; losing the rate
    // update should not lose the answer.
    let interaction = InteractionInput {
        kind: "doubt".to_string(),
        subject: Some(payload.subject.clone()),
        score: None,
        difficulty: None,
        time_spent: None,
    };
    if let Err(err) = state.mastery().record_interaction(&user.id, interaction).await {
        tracing::error!(error = %err, "doubt interaction not recorded");
    }

    SuccessResponse::of(ChatData {
        response: reply,
        learning_rate,
        timestamp: Utc::now(),
    })
    .into_response()
}

pub async fn generate_content(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<GenerateContentRequest>,
) -> Response {
    if user.role != Role::Teacher {
        return json_error(
            StatusCode::FORBIDDEN,
            "FORBIDDEN",
            "Only teachers can generate content",
        )
        .into_response();
    }

    let difficulty = payload.difficulty.as_deref().unwrap_or("medium");
    let content_type = payload.content_type.as_deref().unwrap_or("Lesson");

    let content = state
        .tutor()
        .generate_content(
            &payload.topic,
            difficulty,
            content_type,
            payload.target_audience.as_deref(),
        )
        .await;

    match content {
        Ok(content) => SuccessResponse::of(GeneratedContentData {
            content,
            generated_at: now_iso(),
        })
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "content generation failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Failed to generate content",
            )
            .into_response()
        }
    }
}

pub async fn analyze_performance(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<AnalyzePerformanceRequest>,
) -> Response {
    if user.role != Role::Teacher {
        return json_error(
            StatusCode::FORBIDDEN,
            "FORBIDDEN",
            "Only teachers can analyze performance",
        )
        .into_response();
    }

    let analysis = state.tutor().analyze_performance(&payload.subject);

    SuccessResponse::of(AnalysisData {
        analysis,
        analyzed_at: now_iso(),
    })
    .into_response()
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
