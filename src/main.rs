//! Comment Sentiment Analyzer: service entrypoint.
//! Boots the Axum HTTP server with the job runner, static form and /metrics.

use std::sync::Arc;

use comment_sentiment_analyzer::api::{self, AppState};
use comment_sentiment_analyzer::bootstrap;
use comment_sentiment_analyzer::config::AppConfig;
use comment_sentiment_analyzer::metrics::Metrics;
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    bootstrap::init_tracing();

    let cfg = AppConfig::load()?;
    let runner = bootstrap::build_runner(&cfg)?;
    let metrics = Metrics::init()?;

    let router = api::router(AppState::new(Arc::new(runner))).merge(metrics.router());

    Ok(router.into())
}
