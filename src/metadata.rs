use log::{debug, error};

use crate::VideoMetadata;
use crate::ytdlp::VideoExtractor;

/// Fetch descriptive metadata for a video. Always returns a usable record:
/// backend failure degrades to a minimal record annotated with the error.
pub async fn fetch(extractor: &dyn VideoExtractor, url: &str) -> VideoMetadata {
    match extractor.info(url).await {
        Ok(info) => {
            debug!("Metadata extracted for {url}");
            VideoMetadata {
                title: info.title.unwrap_or_else(|| "Unknown".to_string()),
                author: info.uploader,
                length_seconds: info.duration.map(|d| d.max(0.0) as u64),
                views: info.view_count,
                publish_date: info.upload_date,
                video_id: info.id,
                thumbnail_url: info.thumbnail,
                source_url: url.to_string(),
                error: None,
            }
        }
        Err(e) => {
            error!("Metadata extraction failed for {url}: {e}");
            VideoMetadata::unknown(url).with_error(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ytdlp::VideoInfo;
    use async_trait::async_trait;
    use eyre::{Result, bail};
    use std::path::{Path, PathBuf};

    struct FailingExtractor;

    #[async_trait]
    impl VideoExtractor for FailingExtractor {
        async fn info(&self, _url: &str) -> Result<VideoInfo> {
            bail!("network unreachable")
        }

        async fn fetch_subtitles(&self, _url: &str, _dest_stem: &Path, _langs: &[String]) -> Result<Vec<PathBuf>> {
            bail!("unused")
        }

        async fn download_audio(&self, _url: &str, _dest: &Path) -> Result<()> {
            bail!("unused")
        }
    }

    struct FullExtractor;

    #[async_trait]
    impl VideoExtractor for FullExtractor {
        async fn info(&self, _url: &str) -> Result<VideoInfo> {
            Ok(VideoInfo {
                id: Some("dQw4w9WgXcQ".to_string()),
                title: Some("A Video".to_string()),
                uploader: Some("A Channel".to_string()),
                duration: Some(212.4),
                view_count: Some(42),
                upload_date: Some("20091025".to_string()),
                thumbnail: Some("https://i.ytimg.example/t.jpg".to_string()),
                description: None,
            })
        }

        async fn fetch_subtitles(&self, _url: &str, _dest_stem: &Path, _langs: &[String]) -> Result<Vec<PathBuf>> {
            bail!("unused")
        }

        async fn download_audio(&self, _url: &str, _dest: &Path) -> Result<()> {
            bail!("unused")
        }
    }

    #[tokio::test]
    async fn test_backend_failure_yields_unknown_record() {
        let meta = fetch(&FailingExtractor, "https://youtu.be/dQw4w9WgXcQ").await;
        assert_eq!(meta.title, "Unknown");
        assert_eq!(meta.source_url, "https://youtu.be/dQw4w9WgXcQ");
        assert!(meta.error.as_deref().unwrap().contains("network unreachable"));
    }

    #[tokio::test]
    async fn test_fields_mapped_from_backend_info() {
        let meta = fetch(&FullExtractor, "https://youtu.be/dQw4w9WgXcQ").await;
        assert_eq!(meta.title, "A Video");
        assert_eq!(meta.author.as_deref(), Some("A Channel"));
        assert_eq!(meta.length_seconds, Some(212));
        assert_eq!(meta.views, Some(42));
        assert_eq!(meta.video_id.as_deref(), Some("dQw4w9WgXcQ"));
        assert!(meta.error.is_none());
    }
}
