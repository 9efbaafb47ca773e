pub mod email;
pub mod report;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::JobFailure;
use crate::partition::AnalysisResult;
use crate::pipeline::JobRequest;

/// Receives a finished analysis and hands it to the requester.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn deliver(&self, job: &JobRequest, result: &AnalysisResult) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Called once when a job ends in `Failed`.
#[async_trait]
pub trait FailureHook: Send + Sync {
    async fn on_failure(&self, job: &JobRequest, failure: &JobFailure);
}

/// Default hook: the failure is logged and the requester hears nothing.
pub struct LogOnlyFailureHook;

#[async_trait]
impl FailureHook for LogOnlyFailureHook {
    async fn on_failure(&self, job: &JobRequest, failure: &JobFailure) {
        tracing::warn!(
            target: "notify",
            job_id = %job.job_id, requester = %job.requester_tag(), reason = failure.kind(),
            error = %failure,
            "job failed; requester not notified"
        );
    }
}

/// Sink used when SMTP is not configured: logs the counts only.
pub struct LogSink;

#[async_trait]
impl ReportSink for LogSink {
    async fn deliver(&self, job: &JobRequest, result: &AnalysisResult) -> Result<()> {
        let c = result.counts();
        tracing::info!(
            target: "notify",
            job_id = %job.job_id, total = c.total, positive = c.positive,
            negative = c.negative, neutral = c.neutral,
            "analysis ready (email delivery disabled)"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
