// src/video_id.rs
//! Video identifier extraction from the URL shapes people paste into the form.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::error::ExtractError;

/// Canonical 11-character video identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered matchers; the first one that captures wins.
static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // watch?v=, watch?...&v=, youtu.be/, /embed/, /v/, /shorts/
        concat!(
            r"(?:youtube\.com/watch\?v=|youtube\.com/watch\?.*&v=|youtu\.be/",
            r"|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/)",
            r"([0-9A-Za-z_-]{11})(?:[#&?/]|$)",
        ),
        // any other host path or query carrying an id-shaped segment
        r"(?:v=|/)([0-9A-Za-z_-]{11})(?:[#&?/]|$)",
        // bare id
        r"^([0-9A-Za-z_-]{11})$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("video id pattern"))
    .collect()
});

/// Extract the video id from a watch URL, short link, embed URL or a bare id.
pub fn extract(url: &str) -> Result<VideoId, ExtractError> {
    let input = url.trim();
    PATTERNS
        .iter()
        .find_map(|re| re.captures(input))
        .and_then(|caps| caps.get(1))
        .map(|m| VideoId(m.as_str().to_string()))
        .ok_or_else(|| ExtractError {
            input: input.to_string(),
        })
}
