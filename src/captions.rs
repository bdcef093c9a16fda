use regex::Regex;

/// Markup family of a subtitle payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionFormat {
    WebVtt,
    Srt,
    Generic,
}

impl CaptionFormat {
    /// Derive the format from a file extension.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "vtt" => CaptionFormat::WebVtt,
            "srt" => CaptionFormat::Srt,
            _ => CaptionFormat::Generic,
        }
    }

    /// Derive the format from a caption URL, looking at both the path
    /// suffix and any `format=` query parameter.
    pub fn from_url(url: &str) -> Self {
        if url.ends_with(".vtt") || url.contains("format=vtt") {
            CaptionFormat::WebVtt
        } else if url.ends_with(".srt") || url.contains("format=srt") {
            CaptionFormat::Srt
        } else {
            CaptionFormat::Generic
        }
    }
}

/// Flatten raw subtitle markup into prose.
///
/// Cue timing, indexes, and headers are dropped; consecutive duplicate cue
/// lines (rolling captions in auto-generated tracks) collapse to one. The
/// surviving lines are joined with single spaces.
pub fn parse(raw: &str, format: CaptionFormat) -> String {
    match format {
        CaptionFormat::WebVtt => parse_vtt(raw),
        CaptionFormat::Srt => parse_srt(raw),
        CaptionFormat::Generic => collapse_whitespace(raw),
    }
}

fn timestamp_re() -> Regex {
    // Matches cue timing lines: HH:MM:SS or MM:SS prefixes, with or
    // without the --> range that follows.
    Regex::new(r"^\d{2}:\d{2}").unwrap()
}

fn parse_vtt(content: &str) -> String {
    let ts = timestamp_re();
    let arrow = Regex::new(r"^-->$").unwrap();
    let tag = Regex::new(r"<[^>]+>").unwrap();

    let mut lines: Vec<String> = Vec::new();
    for line in content.lines() {
        let line = tag.replace_all(line.trim(), "").to_string();
        if line.is_empty()
            || line.starts_with("WEBVTT")
            || ts.is_match(&line)
            || arrow.is_match(&line)
        {
            continue;
        }
        if lines.last().map(|prev| prev == &line).unwrap_or(false) {
            continue;
        }
        lines.push(line);
    }
    lines.join(" ")
}

fn parse_srt(content: &str) -> String {
    let ts = timestamp_re();
    let arrow = Regex::new(r"^-->$").unwrap();
    let index = Regex::new(r"^\d+$").unwrap();

    let mut lines: Vec<&str> = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || index.is_match(line) || ts.is_match(line) || arrow.is_match(line) {
            continue;
        }
        if lines.last().map(|prev| *prev == line).unwrap_or(false) {
            continue;
        }
        lines.push(line);
    }
    lines.join(" ")
}

fn collapse_whitespace(content: &str) -> String {
    let ws = Regex::new(r"\s+").unwrap();
    ws.replace_all(content.trim(), " ").to_string()
}
