use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{Html, IntoResponse},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::page;
use super::session::{session_cookie, Sessions};

pub struct AppState {
    pub sessions: Arc<Sessions>,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

#[derive(Deserialize)]
pub struct AnalyzeForm {
    #[serde(default)]
    pub domain: String,
}

/// Render the page for the session's current state
pub async fn index(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    let (id, analyzer) = state.sessions.resolve(&headers).await;
    (
        [(header::SET_COOKIE, session_cookie(&id))],
        Html(page::render(&analyzer.snapshot())),
    )
}

/// Submit the form, then render the resulting state
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<AnalyzeForm>,
) -> impl IntoResponse {
    let (id, analyzer) = state.sessions.resolve(&headers).await;

    // Run detached so a dropped connection cannot strand the component in
    // the loading state.
    let task = {
        let analyzer = Arc::clone(&analyzer);
        tokio::spawn(async move { analyzer.submit(&form.domain).await })
    };
    if let Err(e) = task.await {
        tracing::error!("Analysis task failed: {}", e);
    }

    (
        [(header::SET_COOKIE, session_cookie(&id))],
        Html(page::render(&analyzer.snapshot())),
    )
}

/// Current component state as JSON
pub async fn view_state(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let (id, analyzer) = state.sessions.resolve(&headers).await;
    (
        [(header::SET_COOKIE, session_cookie(&id))],
        Json(analyzer.snapshot()),
    )
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}
