pub mod captions;
pub mod config;
pub mod identity;
pub mod metadata;
pub mod mirror;
pub mod output;
pub mod pipeline;
pub mod strategy;
pub mod subdl;
pub mod transcript_api;
pub mod whisper;
pub mod ytdlp;

use serde::Serialize;

/// Descriptive metadata for a video, independent of transcript acquisition.
///
/// `source_url` is always populated; every other field degrades to absent
/// rather than making the record unusable.
#[derive(Debug, Clone, Serialize)]
pub struct VideoMetadata {
    pub title: String,
    pub author: Option<String>,
    pub length_seconds: Option<u64>,
    pub views: Option<u64>,
    pub publish_date: Option<String>,
    pub video_id: Option<String>,
    pub thumbnail_url: Option<String>,
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VideoMetadata {
    /// Minimal record used whenever the extraction backend fails.
    pub fn unknown(source_url: &str) -> Self {
        VideoMetadata {
            title: "Unknown".to_string(),
            author: None,
            length_seconds: None,
            views: None,
            publish_date: None,
            video_id: None,
            thumbnail_url: None,
            source_url: source_url.to_string(),
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Extract video ID from various YouTube URL formats
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    // Bare 11-character video ID
    if regex::Regex::new(r"^[a-zA-Z0-9_-]{11}$").unwrap().is_match(input) {
        return Some(input.to_string());
    }

    // youtube.com/watch?v=ID
    if let Some(caps) = regex::Regex::new(r"(?:youtube\.com/watch\?.*v=)([a-zA-Z0-9_-]{11})")
        .unwrap()
        .captures(input)
    {
        return Some(caps[1].to_string());
    }

    // youtu.be/ID
    if let Some(caps) = regex::Regex::new(r"youtu\.be/([a-zA-Z0-9_-]{11})")
        .unwrap()
        .captures(input)
    {
        return Some(caps[1].to_string());
    }

    // youtube.com/embed/ID
    if let Some(caps) = regex::Regex::new(r"youtube\.com/embed/([a-zA-Z0-9_-]{11})")
        .unwrap()
        .captures(input)
    {
        return Some(caps[1].to_string());
    }

    // youtube.com/v/ID (old embed format)
    if let Some(caps) = regex::Regex::new(r"youtube\.com/v/([a-zA-Z0-9_-]{11})")
        .unwrap()
        .captures(input)
    {
        return Some(caps[1].to_string());
    }

    // youtube.com/shorts/ID
    if let Some(caps) = regex::Regex::new(r"youtube\.com/shorts/([a-zA-Z0-9_-]{11})")
        .unwrap()
        .captures(input)
    {
        return Some(caps[1].to_string());
    }

    None
}
