use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::config::FrontendConfig;

use super::handlers::{analyze, health_check, index, view_state, AppState};
use super::middleware::log_request;
use super::session::Sessions;
use super::static_files::serve_embedded;

pub fn create_router(sessions: Arc<Sessions>, frontend: FrontendConfig) -> Router {
    let state = Arc::new(AppState { sessions });

    let router = Router::new()
        .route("/", get(index))
        .route("/analyze", post(analyze))
        .route("/api/view", get(view_state))
        .route("/health", get(health_check))
        .with_state(state);

    let router = match frontend.static_dir {
        Some(dir) => router.nest_service("/assets", ServeDir::new(dir)),
        None => router.route("/assets/{*path}", get(serve_embedded)),
    };

    router.layer(middleware::from_fn(log_request))
}
