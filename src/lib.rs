// src/lib.rs
// Public library surface for the service binary, the one-shot CLI and integration tests.

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod jobs;
pub mod metrics;
pub mod normalize;
pub mod notify;
pub mod partition;
pub mod pipeline;
pub mod sentiment;
pub mod video_id;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::error::{ExtractError, JobFailure, PartitionError, SourceError};
pub use crate::ingest::types::{Comment, CommentApi, CommentSource, Sentiment};
pub use crate::jobs::{JobAck, JobRunner};
pub use crate::partition::{partition, AnalysisResult, SentimentCounts};
pub use crate::pipeline::{JobReport, JobRequest, Pipeline, PipelineSettings};
pub use crate::sentiment::SentimentAnalyzer;
