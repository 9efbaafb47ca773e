// src/config.rs
//! Service settings: optional TOML file, then environment overrides.
//!
//! File lookup:
//!   1) $APP_CONFIG_PATH (must exist)
//!   2) config/app.toml
//!   3) built-in defaults

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::ingest::RetryPolicy;
use crate::pipeline::{EmptyResultPolicy, PipelineSettings};

pub const ENV_CONFIG_PATH: &str = "APP_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceSettings,
    pub jobs: JobSettings,
    pub smtp: SmtpFileSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub api_key: String,
    pub api_base: Option<String>,
    pub max_results: usize,
    pub max_retries: u8,
    pub retry_base_ms: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: None,
            max_results: 1000,
            max_retries: 3,
            retry_base_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JobSettings {
    pub deadline_secs: u64,
    pub max_concurrent: usize,
    pub empty_result_policy: EmptyResultPolicy,
    pub notify_on_failure: bool,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            deadline_secs: 300,
            max_concurrent: 4,
            empty_result_policy: EmptyResultPolicy::Fail,
            notify_on_failure: false,
        }
    }
}

/// SMTP section as it appears in the file; every field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SmtpFileSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub from: Option<String>,
}

/// Complete SMTP settings; only exists when every required field is set.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl AppConfig {
    /// Load file (if any) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = match config_path()? {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        cfg.apply_env()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(v) = env_str("YOUTUBE_API_KEY") {
            self.source.api_key = v;
        }
        if let Some(v) = env_str("YOUTUBE_API_BASE") {
            self.source.api_base = Some(v);
        }
        if let Some(v) = env_parse("MAX_RESULTS")? {
            self.source.max_results = v;
        }
        if let Some(v) = env_parse("SOURCE_MAX_RETRIES")? {
            self.source.max_retries = v;
        }
        if let Some(v) = env_parse("SOURCE_RETRY_BASE_MS")? {
            self.source.retry_base_ms = v;
        }
        if let Some(v) = env_parse("JOB_DEADLINE_SECS")? {
            self.jobs.deadline_secs = v;
        }
        if let Some(v) = env_parse("MAX_CONCURRENT_JOBS")? {
            self.jobs.max_concurrent = v;
        }
        if let Some(v) = env_parse("EMPTY_RESULT_POLICY")? {
            self.jobs.empty_result_policy = v;
        }
        if let Some(v) = env_str("NOTIFY_ON_FAILURE") {
            self.jobs.notify_on_failure =
                matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }

        let smtp = &mut self.smtp;
        for (key, slot) in [
            ("SMTP_HOST", &mut smtp.host),
            ("SMTP_USER", &mut smtp.user),
            ("SMTP_PASS", &mut smtp.pass),
            ("NOTIFY_EMAIL_FROM", &mut smtp.from),
        ] {
            if let Some(v) = env_str(key) {
                *slot = Some(v);
            }
        }
        if let Some(v) = env_parse("SMTP_PORT")? {
            smtp.port = Some(v);
        }
        Ok(())
    }

    /// Some only when user, password and sender are all present.
    /// Host and port fall back to Gmail's STARTTLS relay.
    pub fn smtp_settings(&self) -> Option<SmtpSettings> {
        let s = &self.smtp;
        let non_empty = |o: &Option<String>| {
            o.as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        };
        Some(SmtpSettings {
            host: non_empty(&s.host).unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            port: s.port.unwrap_or(587),
            user: non_empty(&s.user)?,
            pass: non_empty(&s.pass)?,
            from: non_empty(&s.from)?,
        })
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            max_results: self.source.max_results,
            empty_policy: self.jobs.empty_result_policy,
            deadline: Duration::from_secs(self.jobs.deadline_secs.max(1)),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.source.max_retries.max(1),
            base_delay: Duration::from_millis(self.source.retry_base_ms),
        }
    }
}

fn config_path() -> Result<Option<PathBuf>> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Ok(Some(pb));
        }
        return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_PATH);
    Ok(default.exists().then_some(default))
}

fn env_str(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_str(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("invalid {key}='{raw}': {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let c = AppConfig::default();
        assert_eq!(c.source.max_results, 1000);
        assert_eq!(c.jobs.empty_result_policy, EmptyResultPolicy::Fail);
        assert!(!c.jobs.notify_on_failure);
        assert!(c.smtp_settings().is_none());
        assert_eq!(c.retry_policy().max_attempts, 3);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c: AppConfig = toml::from_str(
            r#"
[jobs]
empty_result_policy = "deliver"

[smtp]
host = "smtp.example.com"
user = "u"
pass = "p"
from = "bot@example.com"
"#,
        )
        .unwrap();
        assert_eq!(c.jobs.empty_result_policy, EmptyResultPolicy::Deliver);
        assert_eq!(c.jobs.deadline_secs, 300);
        assert_eq!(c.source.max_results, 1000);
        let smtp = c.smtp_settings().unwrap();
        assert_eq!(smtp.host, "smtp.example.com");
        assert_eq!(smtp.port, 587);
    }

    #[test]
    fn blank_smtp_fields_disable_email() {
        let mut c = AppConfig::default();
        c.smtp.host = Some("smtp.example.com".into());
        c.smtp.user = Some("u".into());
        c.smtp.pass = Some("  ".into());
        c.smtp.from = Some("bot@example.com".into());
        assert!(c.smtp_settings().is_none());
    }

    #[test]
    fn host_defaults_to_gmail_relay() {
        let mut c = AppConfig::default();
        c.smtp.user = Some("u".into());
        c.smtp.pass = Some("p".into());
        c.smtp.from = Some("bot@example.com".into());
        let smtp = c.smtp_settings().unwrap();
        assert_eq!(smtp.host, DEFAULT_SMTP_HOST);
        assert_eq!(smtp.port, 587);
    }
}
