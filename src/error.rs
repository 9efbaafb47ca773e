// src/error.rs
//! Typed failures for every stage of a comment analysis job.

use thiserror::Error;

/// URL could not be turned into a video identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not extract a video id from '{input}'")]
pub struct ExtractError {
    pub input: String,
}

/// Failures reported by the comment source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("video not found")]
    VideoNotFound,

    #[error("comments are disabled for this video")]
    CommentsDisabled,

    /// Unclassified upstream failure; carries the raw code and message.
    #[error("source api error [{code}]: {message}")]
    Upstream { code: String, message: String },

    #[error("invalid {field} timestamp '{value}' on comment {comment_id}")]
    InvalidTimestamp {
        comment_id: String,
        field: &'static str,
        value: String,
    },
}

impl SourceError {
    pub fn upstream(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Raised when a comment reaches the partitioner without a sentiment label.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PartitionError {
    #[error("comment {comment_id} has no sentiment")]
    IncompleteClassification { comment_id: String },
}

/// Terminal reason a job ended in `Failed`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobFailure {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(#[from] ExtractError),

    #[error("video not found")]
    VideoNotFound,

    #[error("comments are disabled for this video")]
    CommentsDisabled,

    #[error("no comments found for this video")]
    NoComments,

    #[error("{0}")]
    Source(SourceError),

    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("job exceeded its deadline of {0}s")]
    DeadlineExceeded(u64),
}

impl JobFailure {
    /// Stable short label, used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            JobFailure::InvalidInput(_) => "invalid_input",
            JobFailure::NotFound(_) => "not_found",
            JobFailure::VideoNotFound => "video_not_found",
            JobFailure::CommentsDisabled => "comments_disabled",
            JobFailure::NoComments => "no_comments",
            JobFailure::Source(_) => "source_error",
            JobFailure::InternalInvariantViolation(_) => "internal_invariant_violation",
            JobFailure::Delivery(_) => "delivery",
            JobFailure::DeadlineExceeded(_) => "deadline_exceeded",
        }
    }
}

impl From<SourceError> for JobFailure {
    fn from(e: SourceError) -> Self {
        match e {
            SourceError::VideoNotFound => JobFailure::VideoNotFound,
            SourceError::CommentsDisabled => JobFailure::CommentsDisabled,
            other => JobFailure::Source(other),
        }
    }
}

impl From<PartitionError> for JobFailure {
    fn from(e: PartitionError) -> Self {
        JobFailure::InternalInvariantViolation(e.to_string())
    }
}
