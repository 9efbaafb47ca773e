// src/notify/report.rs
//! HTML bodies for the result and failure e-mails.

use crate::error::JobFailure;
use crate::partition::SentimentCounts;

pub fn subject(video_url: &str) -> String {
    format!("YouTube Comments Analysis for {video_url}")
}

pub fn failure_subject(video_url: &str) -> String {
    format!("YouTube Comments Analysis failed for {video_url}")
}

pub fn render_summary_html(c: &SentimentCounts) -> String {
    format!(
        "<h2>YouTube Comments Analysis Report</h2>\n\
         <p>Please find attached the analysis of the YouTube video comments you requested.</p>\n\
         <p>Summary:</p>\n\
         <ul>\n\
         <li>Total Comments: {}</li>\n\
         <li>Positive Comments: {}</li>\n\
         <li>Negative Comments: {}</li>\n\
         <li>Neutral Comments: {}</li>\n\
         </ul>\n\
         <p>Thank you for using our service!</p>\n",
        c.total, c.positive, c.negative, c.neutral
    )
}

pub fn render_failure_html(video_url: &str, failure: &JobFailure) -> String {
    format!(
        "<h2>YouTube Comments Analysis Failed</h2>\n\
         <p>We could not analyze the comments for <code>{}</code>.</p>\n\
         <p>Reason: {}</p>\n",
        html_escape::encode_text(video_url),
        html_escape::encode_text(&failure.to_string())
    )
}
