// src/jobs.rs
//! Non-blocking job submission on top of [`Pipeline`].

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::error::JobFailure;
use crate::pipeline::{JobReport, JobRequest, Pipeline};

pub const ACK_MESSAGE: &str =
    "Analysis started! You will receive an email when it's complete.";

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("jobs_submitted_total", "Jobs accepted for processing.");
    });
}

/// Returned to the submitter as soon as the job is spawned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobAck {
    pub message: String,
    pub status: &'static str,
    pub job_id: String,
}

pub struct Submission {
    pub ack: JobAck,
    /// Callers are free to drop this; the job keeps running.
    pub handle: JoinHandle<Result<JobReport, JobFailure>>,
}

pub struct JobRunner {
    pipeline: Arc<Pipeline>,
    permits: Arc<Semaphore>,
}

impl JobRunner {
    pub fn new(pipeline: Arc<Pipeline>, max_concurrent: usize) -> Self {
        Self {
            pipeline,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Validate, spawn, acknowledge. Never waits on a running job.
    pub fn submit(&self, video_url: &str, destination: &str) -> Result<Submission, JobFailure> {
        ensure_metrics_described();
        let job = JobRequest::new(video_url, destination)?;
        counter!("jobs_submitted_total").increment(1);
        tracing::info!(
            target: "jobs",
            job_id = %job.job_id, requester = %job.requester_tag(),
            "job submitted"
        );

        let ack = JobAck {
            message: ACK_MESSAGE.to_string(),
            status: "processing",
            job_id: job.job_id.clone(),
        };

        let pipeline = Arc::clone(&self.pipeline);
        let permits = Arc::clone(&self.permits);
        let handle = tokio::spawn(async move {
            // Semaphore is never closed.
            let _permit = permits.acquire_owned().await.map_err(|e| {
                JobFailure::InternalInvariantViolation(format!("job permits closed: {e}"))
            })?;
            pipeline.run(&job).await
        });

        Ok(Submission { ack, handle })
    }
}
