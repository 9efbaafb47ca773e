// src/bootstrap.rs
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::AppConfig;
use crate::ingest::providers::youtube::YoutubeApi;
use crate::ingest::types::CommentSource;
use crate::ingest::CommentFetcher;
use crate::jobs::JobRunner;
use crate::notify::email::{EmailFailureHook, EmailReportSink, EmailSender};
use crate::notify::{FailureHook, LogOnlyFailureHook, LogSink, ReportSink};
use crate::pipeline::Pipeline;

pub const DEFAULT_LOG_FILTER: &str = "comment_sentiment_analyzer=info,warn";

/// Compact logs by default, JSON lines with LOG_FORMAT=json.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

/// Live source: the YouTube Data API behind the paginating, retrying fetcher.
pub fn build_source(cfg: &AppConfig) -> anyhow::Result<Arc<dyn CommentSource>> {
    if cfg.source.api_key.is_empty() {
        warn!(target: "bootstrap", "YOUTUBE_API_KEY is not set; every fetch will be rejected upstream");
    }
    let api = YoutubeApi::new(cfg.source.api_key.clone(), cfg.source.api_base.as_deref())?;
    Ok(Arc::new(
        CommentFetcher::new(api).with_retry(cfg.retry_policy()),
    ))
}

pub fn build_pipeline(
    cfg: &AppConfig,
    source: Arc<dyn CommentSource>,
    sink: Arc<dyn ReportSink>,
    hook: Arc<dyn FailureHook>,
) -> Pipeline {
    Pipeline::new(source, sink, cfg.pipeline_settings()).with_failure_hook(hook)
}

/// Wire the service: e-mail delivery when SMTP is configured, log-only otherwise.
pub fn build_runner(cfg: &AppConfig) -> anyhow::Result<JobRunner> {
    let source = build_source(cfg)?;

    let (sink, hook): (Arc<dyn ReportSink>, Arc<dyn FailureHook>) = match cfg.smtp_settings() {
        Some(smtp) => {
            let sender = Arc::new(EmailSender::new(&smtp)?);
            let sink: Arc<dyn ReportSink> = Arc::new(EmailReportSink::new(Arc::clone(&sender)));
            let hook: Arc<dyn FailureHook> = if cfg.jobs.notify_on_failure {
                Arc::new(EmailFailureHook::new(sender))
            } else {
                Arc::new(LogOnlyFailureHook)
            };
            (sink, hook)
        }
        None => {
            warn!(target: "bootstrap", "SMTP not configured; results will only be logged");
            let sink: Arc<dyn ReportSink> = Arc::new(LogSink);
            let hook: Arc<dyn FailureHook> = Arc::new(LogOnlyFailureHook);
            (sink, hook)
        }
    };

    // Diagnostics only: never the key itself.
    info!(
        target: "bootstrap",
        sink = sink.name(),
        key_len = cfg.source.api_key.len(),
        max_results = cfg.source.max_results,
        max_concurrent = cfg.jobs.max_concurrent,
        deadline_secs = cfg.jobs.deadline_secs,
        notify_on_failure = cfg.jobs.notify_on_failure,
        "runtime configured"
    );

    let pipeline = build_pipeline(cfg, source, sink, hook);
    Ok(JobRunner::new(Arc::new(pipeline), cfg.jobs.max_concurrent))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_without_smtp() {
        let cfg = AppConfig::default();
        let runner = build_runner(&cfg).unwrap();
        assert_eq!(runner.pipeline().settings().max_results, 1000);
    }

    #[tokio::test]
    async fn builds_with_smtp_and_failure_mail() {
        let mut cfg = AppConfig::default();
        cfg.smtp.user = Some("bot".into());
        cfg.smtp.pass = Some("secret".into());
        cfg.smtp.from = Some("bot@example.com".into());
        cfg.jobs.notify_on_failure = true;
        assert!(build_runner(&cfg).is_ok());
    }
}
