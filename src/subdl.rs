use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};

use crate::captions::{self, CaptionFormat};
use crate::config::Config;
use crate::strategy::{Acquisition, MIN_CAPTION_CHARS, MIN_DESCRIPTION_CHARS, Strategy, StrategyInput};
use crate::whisper::{SpeechToText, transcribe_audio};
use crate::ytdlp::{VideoExtractor, VideoInfo};

/// Subtitle extensions the extraction backend may produce, in preference
/// order within a language.
const SUBTITLE_EXTENSIONS: &[&str] = &["vtt", "srt", "ttml", "srv1", "srv2", "srv3"];

/// Subtitle-first strategy with audio-transcription and description
/// fallbacks, all driven through the video-extraction backend.
pub struct SubtitleDownload {
    extractor: Arc<dyn VideoExtractor>,
    speech: Option<Arc<dyn SpeechToText>>,
    config: Arc<Config>,
}

impl SubtitleDownload {
    pub fn new(
        extractor: Arc<dyn VideoExtractor>,
        speech: Option<Arc<dyn SpeechToText>>,
        config: Arc<Config>,
    ) -> Self {
        SubtitleDownload { extractor, speech, config }
    }

    async fn phase_subtitles(&self, input: &StrategyInput, workdir: &std::path::Path) -> Option<String> {
        let stem = workdir.join("subs");
        let files = match self
            .extractor
            .fetch_subtitles(&input.url, &stem, &self.config.subtitle_langs)
            .await
        {
            Ok(files) => files,
            Err(e) => {
                debug!("Subtitle fetch failed: {e}");
                return None;
            }
        };

        let file = select_subtitle_file(&files, &self.config.subtitle_langs)?;
        debug!("Found subtitle file: {}", file.display());

        let content = match std::fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read subtitle file {}: {e}", file.display());
                return None;
            }
        };

        let ext = file.extension().and_then(|e| e.to_str()).unwrap_or("");
        let flat = captions::parse(&content, CaptionFormat::from_extension(ext));
        if flat.chars().count() > MIN_CAPTION_CHARS {
            Some(flat)
        } else {
            debug!("Parsed subtitles too short ({} chars), discarding", flat.chars().count());
            None
        }
    }

    async fn phase_audio(&self, input: &StrategyInput, workdir: &std::path::Path) -> Option<String> {
        let speech = self.speech.as_ref()?;
        let audio_path = workdir.join(format!("audio-{}.mp3", input.video_id));

        if let Err(e) = self.extractor.download_audio(&input.url, &audio_path).await {
            debug!("Audio download failed: {e}");
            return None;
        }

        // The audio artifact is removed on every exit path inside
        // transcribe_audio, including backend failure.
        match transcribe_audio(speech.as_ref(), &audio_path).await {
            Ok(text) if text.chars().count() > MIN_CAPTION_CHARS => Some(text),
            Ok(text) => {
                debug!("Transcription too short ({} chars), discarding", text.chars().count());
                None
            }
            Err(e) => {
                debug!("Transcription failed: {e}");
                None
            }
        }
    }

    fn phase_description(&self, info: &VideoInfo) -> String {
        let title = info.title.as_deref().unwrap_or("Unknown");
        if let Some(description) = info.description.as_deref() {
            if description.chars().count() > MIN_DESCRIPTION_CHARS {
                return format!("Title: {title}\n\nDescription: {description}");
            }
        }
        let author = info.uploader.as_deref().unwrap_or("Unknown");
        format!("Title: {title}\nAuthor: {author}\n\nUnable to extract content from this YouTube video.")
    }
}

#[async_trait]
impl Strategy for SubtitleDownload {
    fn name(&self) -> &'static str {
        "subtitle-download"
    }

    async fn attempt(&self, input: &StrategyInput) -> Acquisition {
        // Metadata acquisition may fail outright (extractor incompatibility,
        // network); continue with a default record.
        let info = match self.extractor.info(&input.url).await {
            Ok(info) => info,
            Err(e) => {
                warn!("Backend info extraction failed, continuing with defaults: {e}");
                VideoInfo::default()
            }
        };

        let workdir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(e) => return Acquisition::Failed(format!("temp dir creation failed: {e}")),
        };

        if let Some(text) = self.phase_subtitles(input, workdir.path()).await {
            return Acquisition::Success(text);
        }

        if let Some(text) = self.phase_audio(input, workdir.path()).await {
            return Acquisition::Success(text);
        }

        Acquisition::Success(self.phase_description(&info))
    }
}

/// Pick the subtitle file to parse: English-coded languages first in the
/// configured preference order, formats in `SUBTITLE_EXTENSIONS` order,
/// first match wins.
fn select_subtitle_file<'a>(files: &'a [PathBuf], langs: &[String]) -> Option<&'a PathBuf> {
    for lang in langs {
        for ext in SUBTITLE_EXTENSIONS {
            let suffix = format!(".{lang}.{ext}");
            if let Some(file) = files.iter().find(|f| f.to_string_lossy().ends_with(&suffix)) {
                return Some(file);
            }
        }
    }
    files.first()
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::{Result, bail};
    use std::path::Path;

    struct StubExtractor {
        info: Result<VideoInfo>,
        subtitle: Option<(&'static str, &'static str)>, // (file suffix, content)
        audio: bool,
    }

    impl StubExtractor {
        fn failing() -> Self {
            StubExtractor {
                info: Err(eyre::eyre!("extractor unavailable")),
                subtitle: None,
                audio: false,
            }
        }

        fn with_info(info: VideoInfo) -> Self {
            StubExtractor { info: Ok(info), subtitle: None, audio: false }
        }
    }

    #[async_trait]
    impl VideoExtractor for StubExtractor {
        async fn info(&self, _url: &str) -> Result<VideoInfo> {
            match &self.info {
                Ok(info) => Ok(info.clone()),
                Err(e) => bail!("{e}"),
            }
        }

        async fn fetch_subtitles(&self, _url: &str, dest_stem: &Path, _langs: &[String]) -> Result<Vec<PathBuf>> {
            match self.subtitle {
                Some((suffix, content)) => {
                    let path = dest_stem.with_file_name(format!("subs{suffix}"));
                    std::fs::write(&path, content)?;
                    Ok(vec![path])
                }
                None => Ok(Vec::new()),
            }
        }

        async fn download_audio(&self, _url: &str, dest: &Path) -> Result<()> {
            if self.audio {
                std::fs::write(dest, b"fake audio")?;
                Ok(())
            } else {
                bail!("audio download failed")
            }
        }
    }

    struct FixedSpeech(String);

    #[async_trait]
    impl SpeechToText for FixedSpeech {
        async fn transcribe(&self, _audio_path: &Path) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    fn input() -> StrategyInput {
        StrategyInput {
            url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
            video_id: "dQw4w9WgXcQ".to_string(),
        }
    }

    fn long_vtt() -> &'static str {
        concat!(
            "WEBVTT\n\n00:00:00.000 --> 00:00:05.000\n",
            "This is a sufficiently long caption line that repeats to pass the usable-captions gate. ",
            "This is a sufficiently long caption line that repeats to pass the usable-captions gate.",
        )
    }

    #[tokio::test]
    async fn test_phase_a_parses_subtitles() {
        let strategy = SubtitleDownload::new(
            Arc::new(StubExtractor {
                info: Ok(VideoInfo::default()),
                subtitle: Some((".en.vtt", long_vtt())),
                audio: false,
            }),
            None,
            Arc::new(Config::default()),
        );

        let result = strategy.attempt(&input()).await;
        let text = result.text().unwrap();
        assert!(text.contains("sufficiently long caption line"));
        assert!(!text.contains("-->"));
    }

    #[tokio::test]
    async fn test_phase_b_transcribes_audio() {
        let spoken = "spoken text ".repeat(20);
        let strategy = SubtitleDownload::new(
            Arc::new(StubExtractor {
                info: Ok(VideoInfo::default()),
                subtitle: None,
                audio: true,
            }),
            Some(Arc::new(FixedSpeech(spoken.clone()))),
            Arc::new(Config::default()),
        );

        let result = strategy.attempt(&input()).await;
        assert_eq!(result.text(), Some(spoken.as_str()));
    }

    #[tokio::test]
    async fn test_phase_c_description_fallback() {
        let info = VideoInfo {
            title: Some("A Video".to_string()),
            description: Some("d".repeat(300)),
            ..VideoInfo::default()
        };
        let strategy = SubtitleDownload::new(Arc::new(StubExtractor::with_info(info)), None, Arc::new(Config::default()));

        let result = strategy.attempt(&input()).await;
        let text = result.text().unwrap();
        assert!(text.starts_with("Title: A Video\n\nDescription: "));
    }

    #[tokio::test]
    async fn test_backend_failure_yields_minimal_stub() {
        let strategy = SubtitleDownload::new(Arc::new(StubExtractor::failing()), None, Arc::new(Config::default()));

        let result = strategy.attempt(&input()).await;
        let text = result.text().unwrap();
        assert!(text.contains("Title: Unknown"));
        assert!(text.contains("Unable to extract content"));
    }

    #[test]
    fn test_select_subtitle_file_prefers_lang_order() {
        let files = vec![
            PathBuf::from("/tmp/subs.en-GB.vtt"),
            PathBuf::from("/tmp/subs.en.srt"),
            PathBuf::from("/tmp/subs.en.vtt"),
        ];
        let langs: Vec<String> = ["en", "en-US", "en-GB"].iter().map(|s| s.to_string()).collect();
        assert_eq!(select_subtitle_file(&files, &langs), Some(&PathBuf::from("/tmp/subs.en.vtt")));
    }

    #[test]
    fn test_select_subtitle_file_falls_back_to_first() {
        let files = vec![PathBuf::from("/tmp/subs.de.vtt")];
        let langs = vec!["en".to_string()];
        assert_eq!(select_subtitle_file(&files, &langs), Some(&PathBuf::from("/tmp/subs.de.vtt")));
    }

    #[test]
    fn test_select_subtitle_file_empty() {
        let langs = vec!["en".to_string()];
        assert_eq!(select_subtitle_file(&[], &langs), None);
    }
}
