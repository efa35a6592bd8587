use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::response::json_error;
use crate::state::AppState;

/// Validates the bearer token (or auth cookie), resolves the user, and
/// stashes the full `User` in request extensions for the handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = crate::auth::extract_token(req.headers()) else {
        return json_error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Access token required")
            .into_response();
    };

    let secret = match crate::auth::token_secret() {
        Ok(secret) => secret,
        Err(err) => {
            tracing::error!(error = %err, "auth misconfigured");
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Something went wrong",
            )
            .into_response();
        }
    };

    let user_id = match crate::auth::verify_token(&token, &secret) {
        Ok(user_id) => user_id,
        Err(_) => {
            return json_error(
                StatusCode::FORBIDDEN,
                "INVALID_TOKEN",
                "Invalid or expired token",
            )
            .into_response();
        }
    };

    let Some(user) = state.users().find(|user| user.id == user_id) else {
        return json_error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "User not found")
            .into_response();
    };

    req.extensions_mut().insert(user);
    next.run(req).await
}
