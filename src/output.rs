use crate::VideoMetadata;

/// Render the transcript as plain text; absence renders as empty.
pub fn render_plain(transcript: Option<&str>) -> String {
    transcript.unwrap_or_default().to_string()
}

/// Render the full result as a JSON object with `transcript` (nullable)
/// and `metadata` members.
pub fn render_json(transcript: Option<&str>, metadata: &VideoMetadata) -> String {
    let value = serde_json::json!({
        "transcript": transcript,
        "metadata": metadata,
    });
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
}
