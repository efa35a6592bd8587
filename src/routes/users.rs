use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;

use crate::models::user::{PreferencesPatch, Role, User};
use crate::response::{json_error, SuccessResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateProfileRequest {
    name: Option<String>,
    preferences: Option<PreferencesPatch>,
}

pub async fn profile(Extension(user): Extension<User>) -> Response {
    SuccessResponse::of(user.to_public()).into_response()
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Response {
    let updated = state
        .users()
        .update(
            |candidate| candidate.id == user.id,
            |record| {
                if let Some(name) = payload.name.as_deref().map(str::trim) {
                    if !name.is_empty() {
                        record.name = name.to_string();
                    }
                }
                if let Some(patch) = payload.preferences.clone() {
                    record.preferences.merge(patch);
                }
                record.updated_at = Utc::now();
            },
        )
        .await;

    match updated {
        Ok(Some(record)) => SuccessResponse::of(record.to_public()).into_response(),
        Ok(None) => {
            json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "User not found").into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "profile update failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Failed to update profile",
            )
            .into_response()
        }
    }
}

pub async fn students(State(state): State<AppState>, Extension(user): Extension<User>) -> Response {
    if user.role != Role::Teacher {
        return json_error(StatusCode::FORBIDDEN, "FORBIDDEN", "Access denied").into_response();
    }

    let students: Vec<_> = state
        .users()
        .filter(|candidate| candidate.role == Role::Student)
        .iter()
        .map(User::to_public)
        .collect();

    SuccessResponse::of(students).into_response()
}

pub async fn leaderboard(State(state): State<AppState>) -> Response {
    let students: Vec<_> = state
        .users()
        .filter(|candidate| candidate.role == Role::Student)
        .iter()
        .map(User::to_summary)
        .collect();

    SuccessResponse::of(students).into_response()
}
