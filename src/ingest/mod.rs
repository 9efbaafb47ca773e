// src/ingest/mod.rs
pub mod providers;
pub mod types;

use async_trait::async_trait;
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use std::future::Future;
use std::time::Duration;

use crate::error::SourceError;
use crate::ingest::types::{ApiError, Comment, CommentApi, CommentSource};
use crate::video_id::VideoId;

/// The source API never returns more than this many threads per page.
pub const MAX_PAGE_SIZE: usize = 100;

const REASON_COMMENTS_DISABLED: &str = "commentsDisabled";
const REASON_VIDEO_NOT_FOUND: &str = "videoNotFound";

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("source_pages_total", "Comment thread pages fetched.");
        describe_counter!(
            "source_retries_total",
            "Source requests retried after a transient failure."
        );
        describe_counter!(
            "source_errors_total",
            "Source fetches aborted with an error."
        );
        describe_counter!("comments_fetched_total", "Top-level comments fetched.");
        describe_histogram!("source_request_ms", "Latency of a single source API request.");
    });
}

/// Per-request retry policy for transient failures.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u8,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (1-based): base * 2^(attempt-1).
    pub fn delay_for(&self, attempt: u8) -> Duration {
        let shift = u32::from(attempt.saturating_sub(1)).min(16);
        self.base_delay.saturating_mul(1u32 << shift)
    }
}

/// Paginating comment source on top of a raw [`CommentApi`].
pub struct CommentFetcher<A> {
    api: A,
    retry: RetryPolicy,
}

impl<A: CommentApi> CommentFetcher<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    async fn with_retries<T, F, Fut>(&self, op: &'static str, mut call: F) -> Result<T, SourceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let max = self.retry.max_attempts.max(1);
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            match call().await {
                Ok(v) => return Ok(v),
                Err(ApiError::Transient(msg)) if attempt < max => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        target: "ingest",
                        op, attempt, delay_ms = delay.as_millis() as u64, error = %msg,
                        "transient source error, retrying"
                    );
                    counter!("source_retries_total").increment(1);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(map_api_error(e)),
            }
        }
    }

    async fn ensure_commentable(&self, video_id: &VideoId) -> Result<(), SourceError> {
        let meta = self
            .with_retries("videos.list", || self.api.list_video(video_id))
            .await?;
        let Some(video) = meta.items.first() else {
            return Err(SourceError::VideoNotFound);
        };
        let has_count = video
            .statistics
            .as_ref()
            .is_some_and(|s| s.comment_count.is_some());
        if !has_count {
            return Err(SourceError::CommentsDisabled);
        }
        Ok(())
    }

    async fn fetch_pages(
        &self,
        video_id: &VideoId,
        max_results: usize,
    ) -> Result<Vec<Comment>, SourceError> {
        self.ensure_commentable(video_id).await?;

        let mut comments: Vec<Comment> = Vec::new();
        let mut page_token: Option<String> = None;

        while comments.len() < max_results {
            let want = MAX_PAGE_SIZE.min(max_results - comments.len());
            let page = self
                .with_retries("commentThreads.list", || {
                    self.api
                        .list_comment_threads(video_id, page_token.as_deref(), want)
                })
                .await?;
            counter!("source_pages_total").increment(1);

            for thread in page.items.into_iter().take(max_results - comments.len()) {
                comments.push(thread.into_comment()?);
            }

            tracing::debug!(
                target: "ingest",
                video_id = %video_id, fetched = comments.len(), has_more = page.next_page_token.is_some(),
                "comment page"
            );

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(comments)
    }
}

#[async_trait]
impl<A: CommentApi> CommentSource for CommentFetcher<A> {
    async fn fetch_all(
        &self,
        video_id: &VideoId,
        max_results: usize,
    ) -> Result<Vec<Comment>, SourceError> {
        ensure_metrics_described();
        match self.fetch_pages(video_id, max_results).await {
            Ok(comments) => {
                counter!("comments_fetched_total").increment(comments.len() as u64);
                Ok(comments)
            }
            Err(e) => {
                counter!("source_errors_total").increment(1);
                tracing::warn!(target: "ingest", video_id = %video_id, error = %e, "comment fetch aborted");
                Err(e)
            }
        }
    }
}

/// Map a raw API error onto the source taxonomy by its reason code.
pub fn map_api_error(e: ApiError) -> SourceError {
    match e {
        ApiError::Transient(msg) => SourceError::upstream("transport", msg),
        ApiError::Rejected { reason, message, .. } => match reason.as_str() {
            REASON_COMMENTS_DISABLED => SourceError::CommentsDisabled,
            REASON_VIDEO_NOT_FOUND => SourceError::VideoNotFound,
            _ => SourceError::Upstream {
                code: reason,
                message,
            },
        },
    }
}
