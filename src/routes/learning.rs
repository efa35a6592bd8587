use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};

use crate::mastery::InteractionInput;
use crate::models::user::User;
use crate::response::{json_error, SuccessResponse};
use crate::state::AppState;

pub async fn profile(State(state): State<AppState>, Extension(user): Extension<User>) -> Response {
    let profile = state.mastery().get_profile(&user.id).await;
    SuccessResponse::of(profile).into_response()
}

pub async fn record_interaction(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<InteractionInput>,
) -> Response {
    match state.mastery().record_interaction(&user.id, payload).await {
        Ok(profile) => SuccessResponse::of(profile).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "interaction not recorded");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Failed to record interaction",
            )
            .into_response()
        }
    }
}

pub async fn subject_summary(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(subject): Path<String>,
) -> Response {
    let summary = state
        .mastery()
        .summarize_subject_history(&user.id, &subject)
        .await;
    SuccessResponse::of(summary).into_response()
}
