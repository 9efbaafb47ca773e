use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::{header::ContentType, Attachment, Mailbox, Message, MultiPart, SinglePart};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{Address, AsyncTransport, Tokio1Executor};
use std::sync::Arc;

use super::{report, FailureHook, ReportSink};
use crate::config::SmtpSettings;
use crate::error::JobFailure;
use crate::export::{self, Artifact};
use crate::partition::AnalysisResult;
use crate::pipeline::JobRequest;

const SENDER_NAME: &str = "YouTube Comment Analyzer";

pub struct EmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailSender {
    pub fn new(smtp: &SmtpSettings) -> Result<Self> {
        let creds = Credentials::new(smtp.user.clone(), smtp.pass.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
            .with_context(|| format!("invalid SMTP host '{}'", smtp.host))?
            .port(smtp.port)
            .credentials(creds)
            .build();

        let addr: Address = smtp
            .from
            .parse()
            .with_context(|| format!("invalid sender address '{}'", smtp.from))?;
        let from = Mailbox::new(Some(SENDER_NAME.to_string()), addr);

        Ok(Self { mailer, from })
    }

    /// Compose the HTML + attachments message. Split out so it can be inspected
    /// without an SMTP server.
    pub fn compose(
        &self,
        to: &str,
        subject: &str,
        html: &str,
        attachments: &[Artifact],
    ) -> Result<Message> {
        let to: Mailbox = to.parse().context("parse recipient")?;

        let mut body = MultiPart::mixed().singlepart(SinglePart::html(html.to_string()));
        for a in attachments {
            let ct = ContentType::parse(a.content_type)
                .with_context(|| format!("content type for {}", a.filename))?;
            body = body.singlepart(Attachment::new(a.filename.clone()).body(a.bytes.clone(), ct));
        }

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .multipart(body)
            .context("build email")
    }

    pub async fn send(
        &self,
        to: &str,
        subject: &str,
        html: &str,
        attachments: &[Artifact],
    ) -> Result<()> {
        let msg = self.compose(to, subject, html, attachments)?;
        self.mailer.send(msg).await.context("send email")?;
        Ok(())
    }
}

/// Mails the HTML summary with the three CSV datasets attached.
pub struct EmailReportSink {
    sender: Arc<EmailSender>,
}

impl EmailReportSink {
    pub fn new(sender: Arc<EmailSender>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl ReportSink for EmailReportSink {
    async fn deliver(&self, job: &JobRequest, result: &AnalysisResult) -> Result<()> {
        let attachments = export::export_all(result)?;
        let html = report::render_summary_html(&result.counts());
        self.sender
            .send(
                &job.destination,
                &report::subject(&job.video_url),
                &html,
                &attachments,
            )
            .await?;
        tracing::info!(target: "notify", job_id = %job.job_id, requester = %job.requester_tag(), "report mailed");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}

/// Opt-in hook that tells the requester their job failed.
pub struct EmailFailureHook {
    sender: Arc<EmailSender>,
}

impl EmailFailureHook {
    pub fn new(sender: Arc<EmailSender>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl FailureHook for EmailFailureHook {
    async fn on_failure(&self, job: &JobRequest, failure: &JobFailure) {
        let html = report::render_failure_html(&job.video_url, failure);
        let subject = report::failure_subject(&job.video_url);
        match self.sender.send(&job.destination, &subject, &html, &[]).await {
            Ok(()) => tracing::info!(
                target: "notify",
                job_id = %job.job_id, reason = failure.kind(),
                "failure notice mailed"
            ),
            Err(e) => tracing::warn!(
                target: "notify",
                job_id = %job.job_id, error = ?e,
                "failure notice could not be sent"
            ),
        }
    }
}
