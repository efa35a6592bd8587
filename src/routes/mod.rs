mod ai;
mod auth;
mod courses;
mod health;
mod learning;
mod users;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/users/profile",
            get(users::profile).put(users::update_profile),
        )
        .route("/api/users/students", get(users::students))
        .route("/api/users/leaderboard", get(users::leaderboard))
        .route("/api/courses", get(courses::list).post(courses::create))
        .route("/api/courses/:id", get(courses::get_by_id))
        .route(
            "/api/courses/:id/assignments/:assignment_id/submit",
            post(courses::submit_assignment),
        )
        .route("/api/courses/:id/add-student", post(courses::add_student))
        .route(
            "/api/courses/:id/add-assignment",
            post(courses::add_assignment),
        )
        .route("/api/ai/chat", post(ai::chat))
        .route("/api/ai/generate-content", post(ai::generate_content))
        .route("/api/ai/analyze-performance", post(ai::analyze_performance))
        .route("/api/learning/profile", get(learning::profile))
        .route(
            "/api/learning/interactions",
            post(learning::record_interaction),
        )
        .route(
            "/api/learning/subjects/:subject/summary",
            get(learning::subject_summary),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::auth::require_auth,
        ));

    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .merge(protected)
        .layer(middleware::from_fn(
            crate::middleware::rate_limit::api_rate_limit,
        ))
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Route not found").into_response()
}
