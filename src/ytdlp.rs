use std::path::{Path, PathBuf};
use std::process::Command;

use async_trait::async_trait;
use eyre::{Result, bail};
use log::debug;
use serde::Deserialize;

use crate::identity::pick;

/// Structured info reported by the extraction backend, decoded field by
/// field instead of trusting ad hoc key presence.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub duration: Option<f64>,
    pub view_count: Option<u64>,
    pub upload_date: Option<String>,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
}

/// Boundary to the video-extraction backend.
///
/// The production implementation shells out to yt-dlp; tests substitute
/// stubs to drive the failure paths.
#[async_trait]
pub trait VideoExtractor: Send + Sync {
    /// Fetch structured info without downloading anything.
    async fn info(&self, url: &str) -> Result<VideoInfo>;

    /// Request subtitle files (manual and auto-generated) for the given
    /// language preference list, written next to `dest_stem`. Returns the
    /// paths that materialized.
    async fn fetch_subtitles(&self, url: &str, dest_stem: &Path, langs: &[String]) -> Result<Vec<PathBuf>>;

    /// Download best-available audio as mp3 to `dest`.
    async fn download_audio(&self, url: &str, dest: &Path) -> Result<()>;
}

/// yt-dlp-backed extractor.
pub struct YtDlp {
    bin: String,
    user_agents: Vec<String>,
}

impl YtDlp {
    pub fn new(user_agents: Vec<String>) -> Self {
        YtDlp {
            bin: "yt-dlp".to_string(),
            user_agents,
        }
    }

    fn user_agent(&self) -> Option<&String> {
        pick(&self.user_agents)
    }

    fn run(&self, args: &[&str]) -> Result<std::process::Output> {
        debug!("Running {} {}", self.bin, args.join(" "));
        let output = Command::new(&self.bin)
            .args(args)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .output();

        match output {
            Ok(out) => Ok(out),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                bail!(
                    "yt-dlp not found. Install it to enable subtitle and audio extraction:\n  \
                     pip install yt-dlp\n  \
                     or: brew install yt-dlp"
                );
            }
            Err(e) => bail!("failed to run yt-dlp: {e}"),
        }
    }
}

#[async_trait]
impl VideoExtractor for YtDlp {
    async fn info(&self, url: &str) -> Result<VideoInfo> {
        let mut args = vec!["--dump-json", "--no-playlist", "--skip-download", "--socket-timeout", "15"];
        if let Some(ua) = self.user_agent() {
            args.extend(["--user-agent", ua.as_str()]);
        }
        args.push(url);

        let output = self.run(&args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("yt-dlp info extraction failed: {}", stderr.trim());
        }

        let info: VideoInfo = serde_json::from_slice(&output.stdout)?;
        Ok(info)
    }

    async fn fetch_subtitles(&self, url: &str, dest_stem: &Path, langs: &[String]) -> Result<Vec<PathBuf>> {
        let lang_list = langs.join(",");
        let stem = dest_stem.to_string_lossy().to_string();
        let mut args = vec![
            "--write-subs",
            "--write-auto-subs",
            "--sub-langs",
            lang_list.as_str(),
            "--skip-download",
            "--no-playlist",
            "--socket-timeout",
            "15",
            "--retries",
            "10",
            "--fragment-retries",
            "10",
            "-o",
            stem.as_str(),
        ];
        if let Some(ua) = self.user_agent() {
            args.extend(["--user-agent", ua.as_str()]);
        }
        args.push(url);

        let output = self.run(&args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("yt-dlp subtitle fetch failed: {}", stderr.trim());
        }

        // Collect whatever files landed next to the stem; the caller
        // applies language and format preference.
        let dir = dest_stem.parent().unwrap_or(Path::new("."));
        let prefix = dest_stem
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut produced = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(&prefix) && name != prefix {
                produced.push(entry.path());
            }
        }
        Ok(produced)
    }

    async fn download_audio(&self, url: &str, dest: &Path) -> Result<()> {
        // yt-dlp appends the extension itself
        let template = dest.with_extension("%(ext)s").to_string_lossy().to_string();
        let mut args = vec![
            "--extract-audio",
            "--audio-format",
            "mp3",
            "--audio-quality",
            "9", // lowest quality = smallest file (speech doesn't need high quality)
            "--no-playlist",
            "--socket-timeout",
            "30",
            "--retries",
            "10",
            "--fragment-retries",
            "10",
            "-o",
            template.as_str(),
        ];
        if let Some(ua) = self.user_agent() {
            args.extend(["--user-agent", ua.as_str()]);
        }
        args.push(url);

        let output = self.run(&args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("yt-dlp audio download failed: {}", stderr.trim());
        }

        if !dest.exists() {
            bail!("yt-dlp did not produce expected output file: {}", dest.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_info_decode() {
        let json = r#"{
            "id": "dQw4w9WgXcQ",
            "title": "Some Video",
            "uploader": "Some Channel",
            "duration": 212.0,
            "view_count": 1000000,
            "upload_date": "20091025",
            "thumbnail": "https://i.ytimg.com/vi/dQw4w9WgXcQ/hq720.jpg",
            "description": "A description",
            "formats": [{"format_id": "18"}]
        }"#;
        let info: VideoInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.id.as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(info.title.as_deref(), Some("Some Video"));
        assert_eq!(info.duration, Some(212.0));
        assert_eq!(info.view_count, Some(1000000));
    }

    #[test]
    fn test_video_info_decode_sparse() {
        let info: VideoInfo = serde_json::from_str(r#"{"id": "abc12345678"}"#).unwrap();
        assert_eq!(info.id.as_deref(), Some("abc12345678"));
        assert!(info.title.is_none());
        assert!(info.description.is_none());
    }
}
