// tests/common/mod.rs
//
// Shared stubs: a scripted CommentApi, a recording ReportSink and FailureHook.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use comment_sentiment_analyzer::ingest::types::{
    ApiError, CommentSnippet, CommentThread, CommentThreadPage, ThreadSnippet, TopLevelComment,
    VideoItem, VideoListResponse, VideoStatistics,
};
use comment_sentiment_analyzer::ingest::{CommentFetcher, RetryPolicy};
use comment_sentiment_analyzer::notify::{FailureHook, ReportSink};
use comment_sentiment_analyzer::{
    AnalysisResult, CommentApi, JobFailure, JobRequest, Pipeline, PipelineSettings,
};
use comment_sentiment_analyzer::video_id::VideoId;

pub const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
pub const TS: &str = "2024-01-01T00:00:00Z";

pub fn thread(id: &str, text: &str) -> CommentThread {
    thread_at(id, text, TS)
}

pub fn thread_at(id: &str, text: &str, published_at: &str) -> CommentThread {
    CommentThread {
        id: id.to_string(),
        snippet: ThreadSnippet {
            top_level_comment: TopLevelComment {
                snippet: CommentSnippet {
                    author_display_name: format!("@author_{id}"),
                    text_display: text.to_string(),
                    like_count: 1,
                    published_at: published_at.to_string(),
                    updated_at: TS.to_string(),
                },
            },
        },
    }
}

/// `n` neutral threads with ids `{prefix}{i}`.
pub fn page(prefix: &str, n: usize, next: Option<&str>) -> CommentThreadPage {
    CommentThreadPage {
        items: (0..n)
            .map(|i| thread(&format!("{prefix}{i}"), "posted on a tuesday"))
            .collect(),
        next_page_token: next.map(String::from),
    }
}

pub fn commentable_video(id: &str) -> VideoListResponse {
    VideoListResponse {
        items: vec![VideoItem {
            id: id.to_string(),
            statistics: Some(VideoStatistics {
                comment_count: Some("42".into()),
            }),
        }],
    }
}

pub fn comments_disabled_video(id: &str) -> VideoListResponse {
    VideoListResponse {
        items: vec![VideoItem {
            id: id.to_string(),
            statistics: Some(VideoStatistics {
                comment_count: None,
            }),
        }],
    }
}

/// Replays scripted responses in order. With the script exhausted the video
/// is commentable and every further page is empty.
#[derive(Default)]
pub struct StubApi {
    videos: Mutex<VecDeque<Result<VideoListResponse, ApiError>>>,
    pages: Mutex<VecDeque<Result<CommentThreadPage, ApiError>>>,
    pub video_calls: AtomicUsize,
    pub page_calls: AtomicUsize,
    /// (page_token, max_results) per thread request.
    pub page_requests: Mutex<Vec<(Option<String>, usize)>>,
}

impl StubApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn video(self, r: Result<VideoListResponse, ApiError>) -> Self {
        self.videos.lock().unwrap().push_back(r);
        self
    }

    pub fn page(self, r: Result<CommentThreadPage, ApiError>) -> Self {
        self.pages.lock().unwrap().push_back(r);
        self
    }

    pub fn pages_served(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    pub fn videos_served(&self) -> usize {
        self.video_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommentApi for StubApi {
    async fn list_video(&self, video_id: &VideoId) -> Result<VideoListResponse, ApiError> {
        self.video_calls.fetch_add(1, Ordering::SeqCst);
        self.videos
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(commentable_video(video_id.as_str())))
    }

    async fn list_comment_threads(
        &self,
        _video_id: &VideoId,
        page_token: Option<&str>,
        max_results: usize,
    ) -> Result<CommentThreadPage, ApiError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.page_requests
            .lock()
            .unwrap()
            .push((page_token.map(String::from), max_results));
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(CommentThreadPage::default()))
    }
}

pub fn no_wait() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::ZERO,
    }
}

pub fn fetcher(api: StubApi) -> CommentFetcher<StubApi> {
    CommentFetcher::new(api).with_retry(no_wait())
}

#[derive(Default)]
pub struct RecordingSink {
    pub fail: bool,
    pub delivered: Mutex<Vec<(JobRequest, AnalysisResult)>>,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ReportSink for RecordingSink {
    async fn deliver(&self, job: &JobRequest, result: &AnalysisResult) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("smtp relay refused the message");
        }
        self.delivered
            .lock()
            .unwrap()
            .push((job.clone(), result.clone()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

#[derive(Default)]
pub struct RecordingHook {
    pub failures: Mutex<Vec<(String, JobFailure)>>,
}

#[async_trait]
impl FailureHook for RecordingHook {
    async fn on_failure(&self, job: &JobRequest, failure: &JobFailure) {
        self.failures
            .lock()
            .unwrap()
            .push((job.job_id.clone(), failure.clone()));
    }
}

pub struct Harness {
    pub sink: Arc<RecordingSink>,
    pub hook: Arc<RecordingHook>,
    pub pipeline: Pipeline,
}

pub fn harness(api: StubApi, settings: PipelineSettings) -> Harness {
    harness_with_sink(api, settings, RecordingSink::default())
}

pub fn harness_with_sink(api: StubApi, settings: PipelineSettings, sink: RecordingSink) -> Harness {
    let sink = Arc::new(sink);
    let hook = Arc::new(RecordingHook::default());
    let pipeline = Pipeline::new(Arc::new(fetcher(api)), sink.clone(), settings)
        .with_failure_hook(hook.clone());
    Harness {
        sink,
        hook,
        pipeline,
    }
}
