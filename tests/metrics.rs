// tests/metrics.rs
//
// One test per process: the Prometheus recorder is global.

mod common;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use common::*;
use comment_sentiment_analyzer::metrics::Metrics;
use comment_sentiment_analyzer::{JobRequest, PipelineSettings};

#[tokio::test]
async fn metrics_endpoint_contains_job_series() {
    let metrics = Metrics::init().expect("install recorder once per process");

    let ok = harness(StubApi::new().page(Ok(page("a", 4, None))), PipelineSettings::default());
    ok.pipeline
        .run(&JobRequest::new(VIDEO_URL, "viewer@example.com").unwrap())
        .await
        .unwrap();

    let empty = harness(StubApi::new(), PipelineSettings::default());
    empty
        .pipeline
        .run(&JobRequest::new(VIDEO_URL, "viewer@example.com").unwrap())
        .await
        .unwrap_err();

    let resp = metrics
        .router()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // axum::body::to_bytes requires an explicit limit
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        "jobs_completed_total",
        "jobs_failed_total",
        "reason=\"no_comments\"",
        "job_duration_ms",
        "source_pages_total",
        "comments_fetched_total",
    ] {
        assert!(text.contains(needle), "missing {needle} in:\n{text}");
    }
}
