// src/pipeline.rs
//! Per-job orchestration: extract -> fetch -> classify -> partition -> deliver.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::JobFailure;
use crate::ingest::types::{Comment, CommentSource};
use crate::normalize::normalize;
use crate::notify::{FailureHook, LogOnlyFailureHook, ReportSink};
use crate::partition::{partition, SentimentCounts};
use crate::sentiment::SentimentAnalyzer;
use crate::video_id::{self, VideoId};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("jobs_completed_total", "Jobs that reached Completed.");
        describe_counter!(
            "jobs_failed_total",
            "Jobs that ended in Failed, labeled by reason."
        );
        describe_histogram!("job_duration_ms", "Wall time of a job run in milliseconds.");
    });
}

static NEXT_JOB: AtomicU64 = AtomicU64::new(1);

/// A validated submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub job_id: String,
    pub video_url: String,
    pub destination: String,
}

impl JobRequest {
    /// Both fields are required; the destination must parse as a mail address.
    /// The URL itself is only checked once the job runs.
    pub fn new(video_url: &str, destination: &str) -> Result<Self, JobFailure> {
        let video_url = video_url.trim();
        let destination = destination.trim();
        if video_url.is_empty() {
            return Err(JobFailure::InvalidInput("video_url is required".into()));
        }
        if destination.is_empty() {
            return Err(JobFailure::InvalidInput("email is required".into()));
        }
        destination
            .parse::<lettre::Address>()
            .map_err(|e| JobFailure::InvalidInput(format!("invalid email address: {e}")))?;

        let n = NEXT_JOB.fetch_add(1, Ordering::Relaxed);
        Ok(Self {
            job_id: format!("{}-{n}", chrono::Utc::now().format("%Y%m%dT%H%M%S")),
            video_url: video_url.to_string(),
            destination: destination.to_string(),
        })
    }

    /// Short hash of the destination. Raw addresses never go to the logs.
    pub fn requester_tag(&self) -> String {
        use sha2::{Digest, Sha256};
        use std::fmt::Write as _;
        let digest = Sha256::digest(self.destination.to_ascii_lowercase().as_bytes());
        let mut out = String::with_capacity(12);
        for b in digest.iter().take(6) {
            let _ = write!(&mut out, "{:02x}", b);
        }
        out
    }
}

/// What to do when the source returns zero comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyResultPolicy {
    #[default]
    Fail,
    Deliver,
}

impl FromStr for EmptyResultPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "deliver" => Ok(Self::Deliver),
            other => Err(format!("expected 'fail' or 'deliver', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub max_results: usize,
    pub empty_policy: EmptyResultPolicy,
    pub deadline: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_results: 1000,
            empty_policy: EmptyResultPolicy::Fail,
            deadline: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Started,
    Extracting,
    Fetching,
    Classifying,
    Partitioning,
    Delivering,
    Completed,
    Failed(JobFailure),
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed(_))
    }

    /// Forward edges only, plus Failed from any non-terminal state.
    pub fn can_advance_to(&self, next: &JobState) -> bool {
        use JobState::*;
        match (self, next) {
            (s, Failed(_)) => !s.is_terminal(),
            (Started, Extracting)
            | (Extracting, Fetching)
            | (Fetching, Classifying)
            | (Classifying, Partitioning)
            | (Partitioning, Delivering)
            | (Delivering, Completed) => true,
            _ => false,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            JobState::Started => "started",
            JobState::Extracting => "extracting",
            JobState::Fetching => "fetching",
            JobState::Classifying => "classifying",
            JobState::Partitioning => "partitioning",
            JobState::Delivering => "delivering",
            JobState::Completed => "completed",
            JobState::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Holds the current state of one job and logs every transition.
#[derive(Debug)]
pub struct JobTracker {
    job_id: String,
    state: JobState,
}

impl JobTracker {
    pub fn new(job_id: &str) -> Self {
        tracing::info!(target: "pipeline", job_id, state = "started", "job state");
        Self {
            job_id: job_id.to_string(),
            state: JobState::Started,
        }
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn advance(&mut self, next: JobState) -> Result<(), JobFailure> {
        if !self.state.can_advance_to(&next) {
            return Err(JobFailure::InternalInvariantViolation(format!(
                "illegal transition {} -> {}",
                self.state, next
            )));
        }
        tracing::info!(
            target: "pipeline",
            job_id = %self.job_id, from = self.state.label(), to = next.label(),
            "job state"
        );
        self.state = next;
        Ok(())
    }

    /// Absorbing. A second failure on an already failed job is ignored.
    pub fn fail(&mut self, failure: JobFailure) {
        if self.state.is_terminal() {
            return;
        }
        tracing::warn!(
            target: "pipeline",
            job_id = %self.job_id, from = self.state.label(), reason = failure.kind(),
            error = %failure,
            "job state failed"
        );
        self.state = JobState::Failed(failure);
    }
}

/// Summary returned when a job completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub job_id: String,
    pub video_id: VideoId,
    pub counts: SentimentCounts,
}

pub struct Pipeline {
    source: Arc<dyn CommentSource>,
    sink: Arc<dyn ReportSink>,
    failure_hook: Arc<dyn FailureHook>,
    analyzer: SentimentAnalyzer,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn CommentSource>,
        sink: Arc<dyn ReportSink>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            source,
            sink,
            failure_hook: Arc::new(LogOnlyFailureHook),
            analyzer: SentimentAnalyzer::new(),
            settings,
        }
    }

    pub fn with_failure_hook(mut self, hook: Arc<dyn FailureHook>) -> Self {
        self.failure_hook = hook;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Fill in `normalized_text` and `sentiment` for every comment, in order.
    /// The label is computed from the raw text.
    pub fn annotate(&self, comments: Vec<Comment>) -> Vec<Comment> {
        comments
            .into_iter()
            .map(|c| {
                let normalized = normalize(&c.raw_text);
                let label = self.analyzer.classify(&c.raw_text);
                c.annotate(normalized, label)
            })
            .collect()
    }

    /// Run one job to a terminal state. Failures go to the failure hook
    /// before being returned.
    pub async fn run(&self, job: &JobRequest) -> Result<JobReport, JobFailure> {
        ensure_metrics_described();
        let started = Instant::now();
        let mut tracker = JobTracker::new(&job.job_id);

        let outcome =
            match tokio::time::timeout(self.settings.deadline, self.stages(job, &mut tracker))
                .await
            {
                Ok(r) => r,
                Err(_) => Err(JobFailure::DeadlineExceeded(self.settings.deadline.as_secs())),
            };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        histogram!("job_duration_ms").record(elapsed_ms as f64);

        match outcome {
            Ok(report) => {
                counter!("jobs_completed_total").increment(1);
                tracing::info!(
                    target: "pipeline",
                    job_id = %job.job_id, video_id = %report.video_id, requester = %job.requester_tag(),
                    total = report.counts.total, positive = report.counts.positive,
                    negative = report.counts.negative, neutral = report.counts.neutral,
                    elapsed_ms, sink = self.sink.name(),
                    "job completed"
                );
                Ok(report)
            }
            Err(failure) => {
                tracker.fail(failure.clone());
                counter!("jobs_failed_total", "reason" => failure.kind()).increment(1);
                self.failure_hook.on_failure(job, &failure).await;
                Err(failure)
            }
        }
    }

    async fn stages(
        &self,
        job: &JobRequest,
        tracker: &mut JobTracker,
    ) -> Result<JobReport, JobFailure> {
        tracker.advance(JobState::Extracting)?;
        let video_id = video_id::extract(&job.video_url)?;

        tracker.advance(JobState::Fetching)?;
        let comments = self
            .source
            .fetch_all(&video_id, self.settings.max_results)
            .await?;
        if comments.is_empty() && self.settings.empty_policy == EmptyResultPolicy::Fail {
            return Err(JobFailure::NoComments);
        }

        tracker.advance(JobState::Classifying)?;
        let annotated = self.annotate(comments);

        tracker.advance(JobState::Partitioning)?;
        let result = partition(annotated)?;

        tracker.advance(JobState::Delivering)?;
        self.sink
            .deliver(job, &result)
            .await
            .map_err(|e| JobFailure::Delivery(format!("{e:#}")))?;

        tracker.advance(JobState::Completed)?;
        Ok(JobReport {
            job_id: job.job_id.clone(),
            video_id,
            counts: result.counts(),
        })
    }
}
