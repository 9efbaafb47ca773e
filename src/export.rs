// src/export.rs
//! Tabular export of the three comment datasets, plus a sink that writes
//! them to a local directory.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

use crate::ingest::types::Comment;
use crate::notify::{report, ReportSink};
use crate::partition::AnalysisResult;
use crate::pipeline::JobRequest;

/// Column order shared by every dataset.
pub const COLUMNS: [&str; 8] = [
    "author",
    "text",
    "likes",
    "published_at",
    "updated_at",
    "comment_id",
    "processed_text",
    "sentiment",
];

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// One serialized dataset, ready to attach or write out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub label: &'static str,
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Serialize comments as CSV with a header row.
pub fn to_csv(comments: &[Comment]) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(COLUMNS)?;

    for c in comments {
        wtr.write_record([
            c.author.clone(),
            c.raw_text.clone(),
            c.like_count.to_string(),
            c.published_at.to_rfc3339(),
            c.updated_at.to_rfc3339(),
            c.id.clone(),
            c.normalized_text.clone().unwrap_or_default(),
            c.sentiment.map(|s| s.to_string()).unwrap_or_default(),
        ])?;
    }

    wtr.into_inner().context("flushing csv buffer")
}

/// `all`, `positive`, `negative` in that order.
pub fn export_all(result: &AnalysisResult) -> Result<Vec<Artifact>> {
    [
        ("all", &result.all),
        ("positive", &result.positive),
        ("negative", &result.negative),
    ]
    .into_iter()
    .map(|(label, rows)| {
        Ok(Artifact {
            label,
            filename: format!("{label}_comments.csv"),
            content_type: CSV_CONTENT_TYPE,
            bytes: to_csv(rows).with_context(|| format!("serializing {label} comments"))?,
        })
    })
    .collect()
}

/// Writes the artifacts and the HTML summary into `<dir>/<job_id>/`.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ReportSink for DirectorySink {
    async fn deliver(&self, job: &JobRequest, result: &AnalysisResult) -> Result<()> {
        let out = self.dir.join(&job.job_id);
        tokio::fs::create_dir_all(&out)
            .await
            .with_context(|| format!("creating {}", out.display()))?;

        for a in export_all(result)? {
            let p = out.join(&a.filename);
            tokio::fs::write(&p, &a.bytes)
                .await
                .with_context(|| format!("writing {}", p.display()))?;
        }
        let html = report::render_summary_html(&result.counts());
        tokio::fs::write(out.join("report.html"), html)
            .await
            .context("writing report.html")?;

        tracing::info!(target: "notify", job_id = %job.job_id, dir = %out.display(), "report written");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "directory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::Sentiment;
    use chrono::{TimeZone, Utc};

    fn sample() -> Comment {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 8, 30, 0).unwrap();
        Comment {
            id: "c1".into(),
            author: "Jo, the \"fan\"".into(),
            raw_text: "Loved it\nsecond line".into(),
            like_count: 7,
            published_at: ts,
            updated_at: ts,
            normalized_text: Some("loved second line".into()),
            sentiment: Some(Sentiment::Positive),
        }
    }

    #[test]
    fn header_and_quoting() {
        let bytes = to_csv(&[sample()]).unwrap();
        let mut rdr = csv::Reader::from_reader(bytes.as_slice());
        let headers: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, COLUMNS);

        let row = rdr.records().next().unwrap().unwrap();
        assert_eq!(&row[0], "Jo, the \"fan\"");
        assert_eq!(&row[1], "Loved it\nsecond line");
        assert_eq!(&row[2], "7");
        assert_eq!(&row[3], "2024-03-09T08:30:00+00:00");
        assert_eq!(&row[5], "c1");
        assert_eq!(&row[7], "positive");
    }

    #[test]
    fn three_named_artifacts() {
        let result = AnalysisResult {
            all: vec![sample()],
            positive: vec![sample()],
            negative: vec![],
        };
        let arts = export_all(&result).unwrap();
        let names: Vec<_> = arts.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(
            names,
            ["all_comments.csv", "positive_comments.csv", "negative_comments.csv"]
        );
        // header-only file for an empty bucket
        let neg = String::from_utf8(arts[2].bytes.clone()).unwrap();
        assert_eq!(neg.lines().count(), 1);
    }

    #[tokio::test]
    async fn directory_sink_writes_job_folder() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(tmp.path());
        let job = JobRequest::new("https://youtu.be/dQw4w9WgXcQ", "viewer@example.com").unwrap();
        let result = AnalysisResult {
            all: vec![sample()],
            positive: vec![sample()],
            negative: vec![],
        };

        sink.deliver(&job, &result).await.unwrap();

        let dir = tmp.path().join(&job.job_id);
        for name in [
            "all_comments.csv",
            "positive_comments.csv",
            "negative_comments.csv",
            "report.html",
        ] {
            assert!(dir.join(name).is_file(), "missing {name}");
        }
        let html = std::fs::read_to_string(dir.join("report.html")).unwrap();
        assert!(html.contains("Total Comments: 1"));
    }
}
