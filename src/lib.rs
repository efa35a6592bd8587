pub mod auth;
pub mod config;
pub mod logging;
pub mod mastery;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::AppState;
use crate::store::StoreError;

pub fn build_app(state: AppState) -> axum::Router {
    let cors = cors_layer(state.config().client_url.as_deref());

    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub fn create_app() -> Result<axum::Router, StoreError> {
    let config = Config::from_env();
    let state = AppState::from_config(config)?;
    Ok(build_app(state))
}

fn cors_layer(client_url: Option<&str>) -> CorsLayer {
    match client_url.and_then(|url| url.parse::<HeaderValue>().ok()) {
        Some(origin) => CorsLayer::new()
            .allow_origin(AllowOrigin::exact(origin))
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    }
}
