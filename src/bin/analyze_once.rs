//! Run one analysis synchronously and write the datasets + HTML summary to a directory.
//!
//! Usage: analyze_once <video_url> [out_dir] [email]

use std::sync::Arc;

use anyhow::{bail, Context};
use comment_sentiment_analyzer::bootstrap;
use comment_sentiment_analyzer::config::AppConfig;
use comment_sentiment_analyzer::export::DirectorySink;
use comment_sentiment_analyzer::notify::LogOnlyFailureHook;
use comment_sentiment_analyzer::pipeline::JobRequest;

const DEFAULT_OUT_DIR: &str = "out";
// Only used to satisfy request validation; nothing is mailed.
const DEFAULT_DESTINATION: &str = "local@localhost";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    bootstrap::init_tracing();

    let mut args = std::env::args().skip(1);
    let Some(url) = args.next() else {
        bail!("usage: analyze_once <video_url> [out_dir] [email]");
    };
    let out_dir = args.next().unwrap_or_else(|| DEFAULT_OUT_DIR.to_string());
    let destination = args.next().unwrap_or_else(|| DEFAULT_DESTINATION.to_string());

    let cfg = AppConfig::load()?;
    let source = bootstrap::build_source(&cfg)?;
    let pipeline = bootstrap::build_pipeline(
        &cfg,
        source,
        Arc::new(DirectorySink::new(&out_dir)),
        Arc::new(LogOnlyFailureHook),
    );

    let job = JobRequest::new(&url, &destination).context("invalid request")?;
    let report = pipeline.run(&job).await.context("analysis failed")?;

    println!(
        "{}: total={} positive={} negative={} neutral={} -> {}/{}",
        report.video_id,
        report.counts.total,
        report.counts.positive,
        report.counts.negative,
        report.counts.neutral,
        out_dir,
        report.job_id
    );
    Ok(())
}
