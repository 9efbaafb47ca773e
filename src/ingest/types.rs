// src/ingest/types.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SourceError;
use crate::video_id::VideoId;

/// Three-way polarity label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One top-level comment. `normalized_text` and `sentiment` stay `None`
/// until the analysis stage fills them in via [`Comment::annotate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub raw_text: String,
    pub like_count: u64,
    pub published_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub normalized_text: Option<String>,
    pub sentiment: Option<Sentiment>,
}

impl Comment {
    pub fn annotate(self, normalized_text: String, sentiment: Sentiment) -> Self {
        Self {
            normalized_text: Some(normalized_text),
            sentiment: Some(sentiment),
            ..self
        }
    }
}

/* ----------------------------
Source API wire shapes
---------------------------- */

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoItem {
    pub id: String,
    #[serde(default)]
    pub statistics: Option<VideoStatistics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    /// The API encodes counts as strings; absent when comments are disabled.
    #[serde(default)]
    pub comment_count: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadPage {
    #[serde(default)]
    pub items: Vec<CommentThread>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentThread {
    pub id: String,
    pub snippet: ThreadSnippet,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSnippet {
    pub top_level_comment: TopLevelComment,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopLevelComment {
    pub snippet: CommentSnippet,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSnippet {
    pub author_display_name: String,
    pub text_display: String,
    #[serde(default)]
    pub like_count: u64,
    pub published_at: String,
    pub updated_at: String,
}

impl CommentThread {
    /// Convert the top-level comment; replies are not carried over.
    pub fn into_comment(self) -> Result<Comment, SourceError> {
        let s = self.snippet.top_level_comment.snippet;
        let published_at = parse_ts(&self.id, "published_at", &s.published_at)?;
        let updated_at = parse_ts(&self.id, "updated_at", &s.updated_at)?;
        Ok(Comment {
            id: self.id,
            author: s.author_display_name,
            raw_text: s.text_display,
            like_count: s.like_count,
            published_at,
            updated_at,
            normalized_text: None,
            sentiment: None,
        })
    }
}

fn parse_ts(comment_id: &str, field: &'static str, value: &str) -> Result<DateTime<Utc>, SourceError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| SourceError::InvalidTimestamp {
            comment_id: comment_id.to_string(),
            field,
            value: value.to_string(),
        })
}

/// Error returned by a single API call, before reason codes are interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Connection failure, timeout, 429 or 5xx. Worth retrying.
    Transient(String),
    /// The API answered with an error body.
    Rejected {
        status: u16,
        reason: String,
        message: String,
    },
}

/// Raw access to the two source endpoints. Pagination and error mapping live
/// in [`super::CommentFetcher`], so implementations stay thin.
#[async_trait]
pub trait CommentApi: Send + Sync {
    async fn list_video(&self, video_id: &VideoId) -> Result<VideoListResponse, ApiError>;

    async fn list_comment_threads(
        &self,
        video_id: &VideoId,
        page_token: Option<&str>,
        max_results: usize,
    ) -> Result<CommentThreadPage, ApiError>;
}

/// What the pipeline needs from a comment source.
#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn fetch_all(
        &self,
        video_id: &VideoId,
        max_results: usize,
    ) -> Result<Vec<Comment>, SourceError>;
}
