use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::models::user::{PublicUser, Role, User};
use crate::response::{json_error, SuccessResponse};
use crate::state::AppState;

const BCRYPT_COST: u32 = 10;
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterRequest {
    email: String,
    password: String,
    name: String,
    role: Role,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct AuthData {
    user: PublicUser,
    token: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Response {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || payload.name.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "BAD_REQUEST", "Email and name are required")
            .into_response();
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return json_error(
            StatusCode::BAD_REQUEST,
            "BAD_REQUEST",
            "Password must be at least 6 characters",
        )
        .into_response();
    }

    if state.users().contains(|user| user.email == email) {
        return json_error(StatusCode::CONFLICT, "CONFLICT", "Email already registered")
            .into_response();
    }

    let password_hash = match bcrypt::hash(&payload.password, BCRYPT_COST) {
        Ok(hash) => hash,
        Err(err) => {
            tracing::error!(error = %err, "password hashing failed");
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Something went wrong",
            )
            .into_response();
        }
    };

    let user = User::new(email, payload.name.trim().to_string(), password_hash, payload.role);

    if let Err(err) = state.users().insert(user.clone()).await {
        tracing::error!(error = %err, "failed to persist user");
        return json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Something went wrong",
        )
        .into_response();
    }

    match issue_auth_data(&user) {
        Ok(data) => (StatusCode::CREATED, SuccessResponse::of(data)).into_response(),
        Err(response) => response,
    }
}

pub async fn login(State(state): State<AppState>, Json(payload): Json<LoginRequest>) -> Response {
    let email = payload.email.trim().to_lowercase();
    let Some(user) = state.users().find(|user| user.email == email) else {
        return json_error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Invalid email or password")
            .into_response();
    };

    if !bcrypt::verify(&payload.password, &user.password_hash).unwrap_or(false) {
        return json_error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Invalid email or password")
            .into_response();
    }

    match issue_auth_data(&user) {
        Ok(data) => SuccessResponse::of(data).into_response(),
        Err(response) => response,
    }
}

fn issue_auth_data(user: &User) -> Result<AuthData, Response> {
    let secret = crate::auth::token_secret().map_err(|err| {
        tracing::error!(error = %err, "auth misconfigured");
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Something went wrong",
        )
        .into_response()
    })?;

    let token = crate::auth::issue_token(&user.id, &secret).map_err(|err| {
        tracing::error!(error = %err, "token issuing failed");
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Something went wrong",
        )
        .into_response()
    })?;

    Ok(AuthData {
        user: user.to_public(),
        token,
    })
}
