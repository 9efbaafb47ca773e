use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use shuttle_axum::axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::jobs::JobRunner;

pub const STATIC_DIR: &str = "static";

#[derive(Clone)]
pub struct AppState {
    runner: Arc<JobRunner>,
}

impl AppState {
    pub fn new(runner: Arc<JobRunner>) -> Self {
        Self { runner }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/analyze", post(analyze))
        .fallback_service(ServeDir::new(STATIC_DIR))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

// Fields are optional so a missing one is a 400 from us, not a 422 from the extractor.
#[derive(Deserialize, Default)]
struct AnalyzeForm {
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

async fn analyze(State(state): State<AppState>, Form(form): Form<AnalyzeForm>) -> Response {
    let url = form.video_url.as_deref().unwrap_or_default();
    let email = form.email.as_deref().unwrap_or_default();

    match state.runner.submit(url, email) {
        Ok(sub) => (StatusCode::ACCEPTED, Json(sub.ack)).into_response(),
        Err(e) => {
            tracing::info!(target: "api", reason = e.kind(), "submission rejected");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
