use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::VideoMetadata;
use crate::config::Config;
use crate::metadata;
use crate::mirror::MirrorApi;
use crate::strategy::{Acquisition, Strategy, StrategyInput};
use crate::subdl::SubtitleDownload;
use crate::transcript_api::TranscriptApi;
use crate::whisper::SpeechToText;
use crate::ytdlp::VideoExtractor;

/// The acquisition orchestrator: metadata first, then the strategy list in
/// fixed priority order, gated on a minimum acceptable transcript length.
///
/// Never raises; every terminal state is a `(text-or-None, metadata)` pair.
pub struct Pipeline {
    extractor: Arc<dyn VideoExtractor>,
    strategies: Vec<Box<dyn Strategy>>,
    min_chars: usize,
}

impl Pipeline {
    /// Standard strategy order: cheapest and most officially sanctioned
    /// first, most expensive and most likely to be blocked last.
    pub fn new(
        config: Arc<Config>,
        extractor: Arc<dyn VideoExtractor>,
        speech: Option<Arc<dyn SpeechToText>>,
    ) -> Self {
        let strategies: Vec<Box<dyn Strategy>> = vec![
            Box::new(TranscriptApi::direct(config.clone())),
            Box::new(TranscriptApi::proxied(config.clone())),
            Box::new(SubtitleDownload::new(extractor.clone(), speech, config.clone())),
            Box::new(MirrorApi::new(config.clone())),
        ];
        Pipeline {
            extractor,
            strategies,
            min_chars: config.min_transcript_chars,
        }
    }

    /// Process a video URL into (transcript, metadata).
    pub async fn process(&self, url: &str) -> (Option<String>, VideoMetadata) {
        let metadata = metadata::fetch(self.extractor.as_ref(), url).await;

        let Some(video_id) = self.resolve_id(url, &metadata).await else {
            error!("Failed to extract video ID from URL: {url}");
            return (None, metadata);
        };
        info!("Processing video ID: {video_id}");

        let input = StrategyInput {
            url: url.to_string(),
            video_id,
        };

        // Results below the acceptance threshold are retained; the longest
        // wins if nothing clears the gate, ties going to the earlier
        // (higher priority) strategy.
        let mut best: Option<String> = None;

        for strategy in &self.strategies {
            info!("Trying strategy: {}", strategy.name());
            match strategy.attempt(&input).await {
                Acquisition::Success(text) => {
                    let chars = text.chars().count();
                    if chars > self.min_chars {
                        info!("Strategy {} produced {chars} chars, accepting", strategy.name());
                        return (Some(text), metadata);
                    }
                    debug!("Strategy {} produced only {chars} chars, retaining as candidate", strategy.name());
                    if chars > best.as_deref().map(|b| b.chars().count()).unwrap_or(0) {
                        best = Some(text);
                    }
                }
                Acquisition::Empty => debug!("Strategy {} found nothing", strategy.name()),
                Acquisition::Failed(reason) => warn!("Strategy {} failed: {reason}", strategy.name()),
            }
        }

        if let Some(text) = best {
            info!("No strategy met the acceptance threshold, returning best partial result");
            return (Some(text), metadata);
        }

        warn!("Failed to retrieve any transcript content for: {url}");
        let stub = format!(
            "Title: {}\nAuthor: {}\n\nUnable to extract content from this YouTube video.",
            metadata.title,
            metadata.author.as_deref().unwrap_or("Unknown"),
        );
        (Some(stub), metadata)
    }

    /// Video id from the metadata record when present, else the URL
    /// patterns, else the extraction backend in info-only mode.
    async fn resolve_id(&self, url: &str, metadata: &VideoMetadata) -> Option<String> {
        if let Some(id) = &metadata.video_id {
            return Some(id.clone());
        }
        if let Some(id) = crate::extract_video_id(url) {
            return Some(id);
        }
        match self.extractor.info(url).await {
            Ok(info) => info.id,
            Err(e) => {
                debug!("Backend ID fallback failed: {e}");
                None
            }
        }
    }
}
