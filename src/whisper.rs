use std::path::Path;

use async_trait::async_trait;
use eyre::{Result, bail};
use log::{debug, warn};
use reqwest::multipart;

/// Maximum file size for a single transcription upload (25 MB)
const MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

/// Speech-to-text transcription model
#[derive(Debug, Clone, Default)]
pub enum WhisperModel {
    Gpt4oMiniTranscribe,
    Gpt4oTranscribe,
    #[default]
    Whisper1,
}

impl WhisperModel {
    pub fn from_name(name: &str) -> Self {
        match name {
            "gpt-4o-mini-transcribe" => WhisperModel::Gpt4oMiniTranscribe,
            "gpt-4o-transcribe" => WhisperModel::Gpt4oTranscribe,
            _ => WhisperModel::Whisper1,
        }
    }

    fn api_name(&self) -> &str {
        match self {
            WhisperModel::Gpt4oMiniTranscribe => "gpt-4o-mini-transcribe",
            WhisperModel::Gpt4oTranscribe => "gpt-4o-transcribe",
            WhisperModel::Whisper1 => "whisper-1",
        }
    }
}

/// Boundary to the speech-to-text backend. May be a remote API or a local
/// model; either way the contract is audio path in, recognized text out.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;
}

/// Whisper-API-backed transcription.
pub struct WhisperApi {
    client: reqwest::Client,
    model: WhisperModel,
}

impl WhisperApi {
    pub fn new(client: reqwest::Client, model: WhisperModel) -> Self {
        WhisperApi { client, model }
    }
}

#[async_trait]
impl SpeechToText for WhisperApi {
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| eyre::eyre!("OPENAI_API_KEY environment variable not set (required for audio transcription)"))?;

        let file_size = std::fs::metadata(audio_path)?.len();
        if file_size > MAX_UPLOAD_BYTES {
            bail!("audio file too large for transcription upload: {file_size} bytes");
        }
        debug!("Uploading {} ({file_size} bytes) for transcription", audio_path.display());

        let file_bytes = std::fs::read(audio_path)?;
        let file_name = audio_path.file_name().unwrap_or_default().to_string_lossy().to_string();

        let file_part = multipart::Part::bytes(file_bytes)
            .file_name(file_name)
            .mime_str("audio/mpeg")?;

        let form = multipart::Form::new()
            .part("file", file_part)
            .text("model", self.model.api_name().to_string())
            .text("response_format", "json");

        let resp = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("transcription API returned {status}: {body}");
        }

        let json: serde_json::Value = resp.json().await?;
        parse_transcription_response(&json)
    }
}

fn parse_transcription_response(json: &serde_json::Value) -> Result<String> {
    if let Some(text) = json.get("text").and_then(|t| t.as_str()) {
        let text = text.trim();
        if !text.is_empty() {
            return Ok(text.to_string());
        }
        bail!("transcription returned empty text");
    }
    bail!("unexpected transcription API response format");
}

/// Transcribe an audio file, then remove it.
///
/// The audio artifact is owned by this call: it is deleted whether the
/// backend succeeds or fails, before the result propagates.
pub async fn transcribe_audio(backend: &dyn SpeechToText, audio_path: &Path) -> Result<String> {
    let result = backend.transcribe(audio_path).await;
    if audio_path.exists() {
        if let Err(e) = std::fs::remove_file(audio_path) {
            warn!("Failed to clean up audio file {}: {e}", audio_path.display());
        } else {
            debug!("Cleaned up audio file: {}", audio_path.display());
        }
    }
    result
}
