// src/partition.rs
//! Split a classified comment set into sentiment buckets.

use serde::Serialize;

use crate::error::PartitionError;
use crate::ingest::types::{Comment, Sentiment};

/// `all` is the annotated input; `positive`/`negative` are order-preserving
/// filtered copies. Neutral comments are only ever counted, not stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub all: Vec<Comment>,
    pub positive: Vec<Comment>,
    pub negative: Vec<Comment>,
}

/// Headline counts for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SentimentCounts {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl AnalysisResult {
    pub fn neutral_count(&self) -> usize {
        self.all.len() - self.positive.len() - self.negative.len()
    }

    pub fn counts(&self) -> SentimentCounts {
        SentimentCounts {
            total: self.all.len(),
            positive: self.positive.len(),
            negative: self.negative.len(),
            neutral: self.neutral_count(),
        }
    }
}

/// Single pass over `all`. Fails on the first comment without a label.
pub fn partition(all: Vec<Comment>) -> Result<AnalysisResult, PartitionError> {
    let mut positive = Vec::new();
    let mut negative = Vec::new();

    for c in &all {
        match c.sentiment {
            Some(Sentiment::Positive) => positive.push(c.clone()),
            Some(Sentiment::Negative) => negative.push(c.clone()),
            Some(Sentiment::Neutral) => {}
            None => {
                return Err(PartitionError::IncompleteClassification {
                    comment_id: c.id.clone(),
                })
            }
        }
    }

    Ok(AnalysisResult {
        all,
        positive,
        negative,
    })
}
