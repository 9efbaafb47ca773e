// src/ingest/providers/youtube.rs
//! YouTube Data API v3 client for the two endpoints the fetcher needs.

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;

use crate::ingest::types::{ApiError, CommentApi, CommentThreadPage, VideoListResponse};
use crate::video_id::VideoId;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

pub struct YoutubeApi {
    http: Client,
    base_url: String,
    api_key: String,
}

impl YoutubeApi {
    pub fn new(api_key: impl Into<String>, base_url: Option<&str>) -> Result<Self> {
        let http = Client::builder()
            .user_agent("comment-sentiment-analyzer/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()
            .context("building youtube http client")?;
        Ok(Self {
            http,
            base_url: base_url
                .unwrap_or(DEFAULT_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            api_key: api_key.into(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let t0 = std::time::Instant::now();
        let url = format!("{}/{}", self.base_url, endpoint);
        let resp = self
            .http
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ApiError::Transient(format!("{endpoint}: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ApiError::Transient(format!("{endpoint} body: {e}")))?;
        histogram!("source_request_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        if !status.is_success() {
            return Err(classify_failure(status, &body));
        }
        serde_json::from_str(&body).map_err(|e| ApiError::Rejected {
            status: status.as_u16(),
            reason: "malformedResponse".to_string(),
            message: format!("{endpoint}: {e}"),
        })
    }
}

#[async_trait]
impl CommentApi for YoutubeApi {
    async fn list_video(&self, video_id: &VideoId) -> Result<VideoListResponse, ApiError> {
        self.get_json(
            "videos",
            &[("part", "snippet,statistics"), ("id", video_id.as_str())],
        )
        .await
    }

    async fn list_comment_threads(
        &self,
        video_id: &VideoId,
        page_token: Option<&str>,
        max_results: usize,
    ) -> Result<CommentThreadPage, ApiError> {
        let max = max_results.to_string();
        let mut query = vec![
            ("part", "snippet"),
            ("videoId", video_id.as_str()),
            ("maxResults", max.as_str()),
            ("textFormat", "plainText"),
            ("order", "relevance"),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }
        self.get_json("commentThreads", &query).await
    }
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<GoogleErrorItem>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorItem {
    #[serde(default)]
    reason: String,
}

/// Turn a non-2xx response into an [`ApiError`]. 429 and 5xx are transient.
fn classify_failure(status: StatusCode, body: &str) -> ApiError {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return ApiError::Transient(format!("http {}", status.as_u16()));
    }
    match serde_json::from_str::<GoogleErrorBody>(body) {
        Ok(parsed) => ApiError::Rejected {
            status: status.as_u16(),
            reason: parsed
                .error
                .errors
                .into_iter()
                .map(|e| e.reason)
                .find(|r| !r.is_empty())
                .unwrap_or_else(|| format!("http_{}", status.as_u16())),
            message: parsed.error.message,
        },
        Err(_) => ApiError::Rejected {
            status: status.as_u16(),
            reason: format!("http_{}", status.as_u16()),
            message: body.chars().take(200).collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn google_error_reason_is_extracted() {
        let body = r#"{"error":{"code":403,"message":"The video has disabled comments.",
            "errors":[{"domain":"youtube.commentThread","reason":"commentsDisabled"}]}}"#;
        match classify_failure(StatusCode::FORBIDDEN, body) {
            ApiError::Rejected { status, reason, message } => {
                assert_eq!(status, 403);
                assert_eq!(reason, "commentsDisabled");
                assert!(message.contains("disabled"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn server_errors_are_transient() {
        assert!(matches!(
            classify_failure(StatusCode::SERVICE_UNAVAILABLE, ""),
            ApiError::Transient(_)
        ));
        assert!(matches!(
            classify_failure(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::Transient(_)
        ));
    }

    #[test]
    fn non_json_error_falls_back_to_status_code() {
        match classify_failure(StatusCode::NOT_FOUND, "<html>nope</html>") {
            ApiError::Rejected { reason, .. } => assert_eq!(reason, "http_404"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
